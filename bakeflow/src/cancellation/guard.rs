//! Drop guard for cleanup that must run even when a future is dropped.

/// Runs a cleanup closure when dropped, unless disarmed.
///
/// Async callers may abandon a future at any await point; holding one of
/// these across the await keeps the cleanup on every exit path.
pub struct CleanupGuard {
    cleanup: Option<Box<dyn FnOnce() + Send>>,
}

impl CleanupGuard {
    /// Creates a new cleanup guard.
    pub fn new<F>(cleanup: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// Disarms the guard, preventing cleanup from running.
    pub fn disarm(&mut self) {
        self.cleanup = None;
    }

    /// Returns true while the cleanup is still pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.cleanup.is_some()
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl std::fmt::Debug for CleanupGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupGuard")
            .field("armed", &self.is_armed())
            .finish()
    }
}
