use std::sync::atomic::{AtomicBool, Ordering};

/// RAII guard marking a start attempt as in flight.
///
/// Clears the flag on drop, including when the attempt future is dropped
/// mid-await.
pub(crate) struct StartGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> StartGuard<'a> {
    /// Claim the flag. `None` when another attempt holds it.
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
