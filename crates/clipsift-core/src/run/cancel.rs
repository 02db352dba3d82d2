//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-run stop request shared between the controller and the worker.
///
/// The worker checks it once per candidate boundary; an inference call in
/// flight always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = CancelFlag::new();
        let worker_side = flag.clone();
        assert!(!worker_side.is_cancelled());

        flag.cancel();
        flag.cancel();
        assert!(worker_side.is_cancelled());
    }

    #[test]
    fn test_fresh_flags_are_independent() {
        let first = CancelFlag::new();
        first.cancel();
        assert!(!CancelFlag::new().is_cancelled());
    }
}
