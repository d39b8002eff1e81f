use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cross-thread stop request, checked at the top of every loop iteration.
#[derive(Clone, Debug, Default)]
pub struct ShutdownToken(Arc<AtomicBool>);

impl ShutdownToken {
    pub fn new() -> Self { Self::default() }
    pub fn request(&self) { self.0.store(true, Ordering::Release); }
    pub fn is_requested(&self) -> bool { self.0.load(Ordering::Acquire) }
}
