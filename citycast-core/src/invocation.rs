use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Issues tokens; starting a new invocation makes every earlier token stale.
#[derive(Debug, Clone, Default)]
pub struct InvocationTracker {
    current: Arc<AtomicU64>,
}

impl InvocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> InvocationToken {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        InvocationToken {
            generation,
            current: Arc::clone(&self.current),
        }
    }

    /// Invalidate all outstanding tokens without starting a new invocation.
    pub fn cancel_all(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

/// Checked before applying the result of any suspended call.
#[derive(Debug, Clone)]
pub struct InvocationToken {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl InvocationToken {
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_token_supersedes_older() {
        let tracker = InvocationTracker::new();
        let a = tracker.begin();
        assert!(a.is_current());

        let b = tracker.begin();
        assert!(!a.is_current());
        assert!(b.is_current());
        assert!(b.generation() > a.generation());
    }

    #[test]
    fn cancel_all_stales_everything() {
        let tracker = InvocationTracker::new();
        let a = tracker.begin();
        tracker.cancel_all();
        assert!(!a.is_current());
    }
}
