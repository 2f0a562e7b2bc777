//! Dispatcher control loop

use crate::core::config::Configuration;
use crate::core::sync::handle_mutex_poison;
use crate::dispatcher::error::{DispatchError, DispatchResult};
use crate::dispatcher::pipeline::{TaskOutcome, TaskRunner};
use crate::dispatcher::signal::WakeSignal;
use crate::registry::api::{ReceiverRegistry, ScannerRegistry};
use crate::store::api::{Area, TaskStore};
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Semaphore};

type ClaimSet = Arc<Mutex<HashSet<String>>>;

/// Polls `queue` and runs each task on its own worker
///
/// At most `tasks.max-concurrent` workers run at once; further tasks wait
/// for a free slot. A task already handed to a worker is not launched again
/// by a later poll.
#[derive(Debug)]
pub struct Dispatcher {
    runner: Arc<TaskRunner>,
    signal: WakeSignal,
    slots: Arc<Semaphore>,
    claimed: ClaimSet,
    poll_interval: Option<Duration>,
}

impl Dispatcher {
    pub fn new(
        config: Arc<Configuration>,
        store: TaskStore,
        receivers: Arc<ReceiverRegistry>,
        scanners: Arc<ScannerRegistry>,
    ) -> Self {
        let max_concurrent = config.tasks.max_concurrent.max(1);
        let poll_interval = config.tasks.poll_interval();
        let runner = TaskRunner::new(config, store, receivers, scanners);

        Self {
            runner: Arc::new(runner),
            signal: WakeSignal::new(),
            slots: Arc::new(Semaphore::new(max_concurrent)),
            claimed: Arc::new(Mutex::new(HashSet::new())),
            poll_interval,
        }
    }

    /// Handle producers use to wake this dispatcher
    pub fn signal(&self) -> WakeSignal {
        self.signal.clone()
    }

    /// Hint that new work may be queued. Never blocks.
    pub fn notify(&self) {
        self.signal.notify();
    }

    pub fn store(&self) -> &TaskStore {
        self.runner.store()
    }

    /// Number of tasks currently claimed by workers
    pub fn in_flight(&self) -> usize {
        self.claimed.lock().map(|set| set.len()).unwrap_or_default()
    }

    /// Run until a store error makes the queue unreadable
    pub async fn run(&self) -> DispatchResult<()> {
        self.control_loop(std::future::pending()).await
    }

    /// Run until `shutdown` fires. Workers already launched keep running.
    pub async fn run_until(&self, mut shutdown: broadcast::Receiver<()>) -> DispatchResult<()> {
        self.control_loop(async move {
            let _ = shutdown.recv().await;
        })
        .await
    }

    async fn control_loop(&self, shutdown: impl Future<Output = ()>) -> DispatchResult<()> {
        tokio::pin!(shutdown);
        log::info!(
            "Dispatcher started on {} ({} slots)",
            self.store().root().display(),
            self.slots.available_permits()
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                launched = self.dispatch_pending() => {
                    let launched = launched?;
                    if launched > 0 {
                        log::debug!("Launched {} task(s)", launched);
                    }
                }
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = self.idle() => {}
            }
        }

        log::info!("Dispatcher stopped; {} task(s) still in flight", self.in_flight());
        Ok(())
    }

    async fn idle(&self) {
        match self.poll_interval {
            Some(interval) => {
                tokio::select! {
                    _ = self.signal.wait() => {}
                    _ = tokio::time::sleep(interval) => log::trace!("Poll interval elapsed"),
                }
            }
            None => self.signal.wait().await,
        }
    }

    /// One poll cycle: launch a worker for every unclaimed queued task.
    ///
    /// Waits for a free slot before each launch. Returns the number of
    /// workers launched.
    pub async fn dispatch_pending(&self) -> DispatchResult<usize> {
        let ids = self.store().list_ids(Area::Queue)?;
        let mut launched = 0;

        for id in ids {
            if self.is_claimed(&id)? {
                continue;
            }

            let permit = self
                .slots
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| DispatchError::Internal {
                    message: e.to_string(),
                })?;

            // no await between claiming and spawning
            let claim = Claim::take(&self.claimed, &id)?;
            let runner = self.runner.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let outcome = runner.run(claim.id()).await;
                if let TaskOutcome::Stranded { area, reason } = &outcome {
                    log::debug!("Task {} left in {}: {}", claim.id(), area, reason);
                }
            });
            launched += 1;
        }

        Ok(launched)
    }

    fn is_claimed(&self, id: &str) -> DispatchResult<bool> {
        let claimed = handle_mutex_poison(self.claimed.lock(), |message| {
            DispatchError::Internal { message }
        })?;
        Ok(claimed.contains(id))
    }
}

/// Marks a task id as owned by a worker until dropped
struct Claim {
    set: ClaimSet,
    id: String,
}

impl Claim {
    fn take(set: &ClaimSet, id: &str) -> DispatchResult<Self> {
        let mut claimed =
            handle_mutex_poison(set.lock(), |message| DispatchError::Internal { message })?;
        claimed.insert(id.to_string());
        Ok(Self {
            set: set.clone(),
            id: id.to_string(),
        })
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        let mut claimed = match self.set.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        claimed.remove(&self.id);
    }
}
