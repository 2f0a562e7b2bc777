use std::sync::Arc;
use tokio::sync::Notify;

/// Wake-up hint for the dispatcher
///
/// Holds at most one pending wake: a [`notify`](Self::notify) issued while
/// nobody is waiting is kept and consumed by the next [`wait`](Self::wait),
/// and repeated notifications coalesce. Notifying never blocks.
#[derive(Debug, Clone, Default)]
pub struct WakeSignal {
    inner: Arc<Notify>,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        self.inner.notify_one();
    }

    pub async fn wait(&self) {
        self.inner.notified().await;
    }
}
