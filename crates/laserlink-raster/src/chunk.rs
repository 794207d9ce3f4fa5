//! Binary chunk encoding
//!
//! Raster byte streams are split into fixed-size chunks and each chunk is
//! base64 encoded on its own, so a single protocol line never carries more
//! than [`CHUNK_SIZE`] bytes of payload.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Maximum number of raw bytes per chunk
pub const CHUNK_SIZE: usize = 51;

/// Character that replaces `+` and `/` when sanitising
pub const SANITISE_REPLACEMENT: char = '9';

/// Split `data` into chunks of at most [`CHUNK_SIZE`] bytes
///
/// Empty input yields no chunks.
pub fn split_bytes(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.chunks(CHUNK_SIZE)
}

/// Number of chunks `len` bytes are split into
pub fn chunk_count(len: usize) -> usize {
    len.div_ceil(CHUNK_SIZE)
}

/// Replace the base64 characters some line readers choke on
///
/// Lossy: decoding a sanitised payload yields slightly different bytes.
pub fn sanitise(encoded: &str) -> String {
    encoded.replace(['+', '/'], &SANITISE_REPLACEMENT.to_string())
}

/// Base64 encode every chunk of `data`, optionally sanitised
pub fn encode_chunks(data: &[u8], sanitised: bool) -> Vec<String> {
    split_bytes(data)
        .map(|chunk| {
            let encoded = STANDARD.encode(chunk);
            if sanitised {
                sanitise(&encoded)
            } else {
                encoded
            }
        })
        .collect()
}

/// Decode chunks produced by [`encode_chunks`] back into one byte stream
pub fn decode_chunks<S: AsRef<str>>(chunks: &[S]) -> Result<Vec<u8>, base64::DecodeError> {
    let mut out = Vec::with_capacity(chunks.len() * CHUNK_SIZE);
    for chunk in chunks {
        out.extend(STANDARD.decode(chunk.as_ref())?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_has_no_chunks() {
        assert_eq!(split_bytes(&[]).count(), 0);
        assert!(encode_chunks(&[], false).is_empty());
        assert_eq!(chunk_count(0), 0);
    }

    #[test]
    fn test_chunk_boundaries() {
        let data = vec![7u8; 103];
        let sizes: Vec<usize> = split_bytes(&data).map(<[u8]>::len).collect();
        assert_eq!(sizes, vec![51, 51, 1]);
        assert_eq!(chunk_count(103), 3);
        assert_eq!(chunk_count(102), 2);
    }

    #[test]
    fn test_sanitise() {
        // 0xfb 0xff encodes to "+/8="
        let encoded = encode_chunks(&[0xfb, 0xff], false);
        assert_eq!(encoded, vec!["+/8=".to_string()]);
        let sanitised = encode_chunks(&[0xfb, 0xff], true);
        assert_eq!(sanitised, vec!["998=".to_string()]);
    }
}
