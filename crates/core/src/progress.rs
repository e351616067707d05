use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Percent value signalling "duration unknown" to progress consumers.
pub const INDETERMINATE: i32 = -1;

/// Progress callback: `(percent, message)`. Percent is [`INDETERMINATE`] or
/// 0..=100, monotonically non-decreasing within one stage.
pub type ProgressSink<'a> = dyn FnMut(i32, &str) + 'a;

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Cooperative, coarse-grained cancellation flag. A pending unit of work
/// (ingestion batch, chunk) is skipped once the token is set; a unit already
/// in progress runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_shared() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }
}
