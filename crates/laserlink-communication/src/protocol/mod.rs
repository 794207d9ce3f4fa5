//! Protocol encoding and line delivery

pub mod encoder;
pub mod sink;

pub use encoder::{GcodeEncoder, ModalState};
pub use sink::{LineSink, TransportSink, WriterSink, ACK};

/// Split a comma-separated list of protocol lines
///
/// Blank entries are dropped; the remaining lines are sent verbatim.
pub fn split_lines(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join protocol lines into a comma-separated list
pub fn join_lines(lines: &[String]) -> String {
    lines.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("G21,G90,G28 XY,M5"), vec!["G21", "G90", "G28 XY", "M5"]);
        assert_eq!(split_lines(" G21 , ,G90,"), vec!["G21", "G90"]);
        assert!(split_lines("").is_empty());
        assert_eq!(join_lines(&split_lines("G0 X0 Y0,M5")), "G0 X0 Y0,M5");
    }
}
