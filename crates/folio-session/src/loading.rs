//! In-flight flag for store operations.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts operations currently in flight; loading while the count is non-zero.
#[derive(Debug, Default)]
pub struct LoadingFlag {
    in_flight: AtomicUsize,
}

impl LoadingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    /// Mark an operation as started. It ends when the guard drops, including
    /// on error return or when the owning future is cancelled.
    pub fn begin(&self) -> LoadingGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        LoadingGuard { flag: self }
    }
}

#[must_use = "loading ends as soon as the guard is dropped"]
pub struct LoadingGuard<'a> {
    flag: &'a LoadingFlag,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
