use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// A repeating background task. Stopping or dropping the handle cancels it.
pub struct RefreshHandle {
    name: String,
    handle: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn stop(self) {
        debug!(target: "runner", task=%self.name, "stopping periodic task");
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Runs `task` immediately and then every `every`, until the returned handle
/// goes away.
pub fn spawn_periodic<F, Fut>(name: &str, every: Duration, mut task: F) -> RefreshHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let label = name.to_string();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            task().await;
        }
    });
    debug!(target: "runner", task=%label, every_ms=every.as_millis() as u64, "periodic task started");
    RefreshHandle {
        name: label,
        handle,
    }
}
