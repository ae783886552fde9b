use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Delays committing a value until input pauses for a fixed interval.
///
/// Each `submit` aborts the previously pending timer, so a burst of
/// calls runs its callback at most once, `delay` after the last call.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn submit<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        let mut pending = self.pending.lock().unwrap();
        if let Some(previous) = pending.replace(task) {
            previous.abort();
        }
    }

    pub fn cancel(&self) {
        if let Some(task) = self.pending.lock().unwrap().take() {
            task.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
