//! Progress reporting for job transmission
//!
//! Listeners are called synchronously on the sending thread. Percentages are
//! non-decreasing within one transmission.

/// Receives progress and task updates during a transmission
pub trait ProgressListener {
    /// Overall progress in percent (0-100)
    fn progress_changed(&mut self, percent: u8);

    /// Human readable description of the current step
    fn task_changed(&mut self, _task: &str) {}
}

/// Listener that ignores every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn progress_changed(&mut self, _percent: u8) {}
}

impl<F> ProgressListener for F
where
    F: FnMut(u8),
{
    fn progress_changed(&mut self, percent: u8) {
        self(percent)
    }
}

/// Listener that records every update, handy for tests and CLI summaries
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProgressLog {
    /// Percentages in the order they were reported
    pub percents: Vec<u8>,
    /// Task descriptions in the order they were reported
    pub tasks: Vec<String>,
}

impl ProgressListener for ProgressLog {
    fn progress_changed(&mut self, percent: u8) {
        self.percents.push(percent);
    }

    fn task_changed(&mut self, task: &str) {
        self.tasks.push(task.to_string());
    }
}

/// Progress after `done` of `total` parts have been sent
///
/// Initialisation accounts for the first 20%, parts share the next 60%.
pub fn part_progress(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 80;
    }
    let span = (done.min(total) as f64) * 60.0 / total as f64;
    20 + span as u8
}
