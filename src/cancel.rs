use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Scan-wide cancellation shared by the aggregator and every in-flight `git` process.
///
/// Tripped explicitly (Ctrl-C handler) or implicitly once the optional deadline passes.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    tripped: AtomicBool,
    deadline: Option<Instant>,
}

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_deadline(after: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                tripped: AtomicBool::new(false),
                deadline: Instant::now().checked_add(after),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.tripped.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.tripped.load(Ordering::SeqCst)
            || self
                .inner
                .deadline
                .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_observe_cancel() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn elapsed_deadline_counts_as_cancelled() {
        let flag = CancelFlag::with_deadline(Duration::ZERO);
        assert!(flag.is_cancelled());
        let later = CancelFlag::with_deadline(Duration::from_secs(3600));
        assert!(!later.is_cancelled());
    }
}
