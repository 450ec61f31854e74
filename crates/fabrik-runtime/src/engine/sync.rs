//! Suspend/resume signalling for the dispatcher thread.

use std::sync::{Condvar, Mutex};

/// Counting semaphore saturating at one pending permit.
///
/// The cycle timer posts one permit per expiry; a post that finds a permit
/// already pending collapses, which the caller can account for.
#[derive(Debug, Default)]
pub(crate) struct SuspendSemaphore {
    permits: Mutex<u32>,
    cvar: Condvar,
}

impl SuspendSemaphore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post one permit.
    ///
    /// Returns `false` when a permit was already pending and the post
    /// collapsed.
    pub fn post(&self) -> bool {
        let mut permits = self.permits.lock().expect("suspend semaphore poisoned");
        if *permits >= 1 {
            return false;
        }
        *permits += 1;
        self.cvar.notify_one();
        true
    }

    /// Block until a permit is available, then consume it.
    pub fn acquire(&self) {
        let mut permits = self.permits.lock().expect("suspend semaphore poisoned");
        while *permits == 0 {
            permits = self.cvar.wait(permits).expect("suspend semaphore poisoned");
        }
        *permits -= 1;
    }
}
