use std::sync::Mutex;
use tokio::task::JoinHandle;

/// Holds the single in-flight background task of a view model.
///
/// Starting a new task aborts the previous one without waiting for it. A task
/// that already finished its work is unaffected; callers guard their writes
/// with a generation check instead of relying on the abort.
#[derive(Debug, Default)]
pub struct Inflight {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Inflight {
    pub fn replace(&self, handle: JoinHandle<()>) {
        let previous = match self.handle.lock() {
            Ok(mut current) => current.replace(handle),
            Err(poisoned) => poisoned.into_inner().replace(handle),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    pub fn cancel(&self) {
        let current = match self.handle.lock() {
            Ok(mut current) => current.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(current) = current {
            current.abort();
        }
    }
}

impl Drop for Inflight {
    fn drop(&mut self) {
        self.cancel();
    }
}
