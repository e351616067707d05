use crate::session::{CleaningResult, RunStats};

/// One-way notifications from a detached session worker to its caller.
#[derive(Debug)]
pub enum SessionEvent {
    /// Progress update; percent is -1 (indeterminate) or 0..=100.
    Progress { percent: i32, message: String },
    /// The run finished; the full result and stats are handed over.
    Completed { result: CleaningResult, stats: RunStats },
    /// The run failed or was cancelled.
    Failed { message: String, detail: Option<String> },
}
