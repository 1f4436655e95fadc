use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-way stop flag shared between the coordinator and the sampling thread.
///
/// It only ever goes from running to stopped. There is no way to clear it;
/// a new run gets a new signal.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests termination. Returns `true` if this call flipped the flag.
    pub fn request_stop(&self) -> bool {
        !self.stopped.swap(true, Ordering::AcqRel)
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}
