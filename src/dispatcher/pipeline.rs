//! Per-task pipeline
//!
//! Runs one queued task to a terminal state:
//!
//! 1. read the record from `queue` (unreadable records stay queued)
//! 2. resolve the receiver, then every scanner; any failure moves the task
//!    straight to `failed`
//! 3. a task with no scanners moves straight to `done`
//! 4. otherwise the task enters `processing`, the receiver fetches and
//!    snapshots the target, and the scanners run in order, stopping at the
//!    first failure
//! 5. the receiver is cleaned up on every path once processing started, and
//!    the task makes exactly one move to `done` or `failed`
//!
//! Every error is handled here; nothing propagates to the control loop.

use crate::core::config::Configuration;
use crate::dispatcher::error::{DispatchError, DispatchResult};
use crate::receiver::api::TargetReceiver;
use crate::registry::api::{ReceiverRegistry, ScannerRegistry};
use crate::scanner::api::Scanner;
use crate::store::api::{Area, StoreError, Task, TaskStatus, TaskStore};
use std::sync::Arc;

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Done,
    /// Moved to `failed` with this reason recorded
    Failed(String),
    /// A store error left the task where it was
    Stranded { area: Area, reason: String },
}

type NamedScanner = (String, Box<dyn Scanner>);

#[derive(Debug, Clone)]
pub struct TaskRunner {
    config: Arc<Configuration>,
    store: TaskStore,
    receivers: Arc<ReceiverRegistry>,
    scanners: Arc<ScannerRegistry>,
}

impl TaskRunner {
    pub fn new(
        config: Arc<Configuration>,
        store: TaskStore,
        receivers: Arc<ReceiverRegistry>,
        scanners: Arc<ScannerRegistry>,
    ) -> Self {
        Self {
            config,
            store,
            receivers,
            scanners,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    /// Run the task `id` currently in `queue`
    pub async fn run(&self, id: &str) -> TaskOutcome {
        let mut task = match self.store.read_task(Area::Queue, id) {
            Ok(task) => task,
            Err(StoreError::NotFound { .. }) => {
                log::debug!("Task {} is no longer queued", id);
                return TaskOutcome::Stranded {
                    area: Area::Queue,
                    reason: "no longer queued".to_string(),
                };
            }
            Err(e) => {
                log::error!("Task {}: unable to read record, leaving it queued: {}", id, e);
                return TaskOutcome::Stranded {
                    area: Area::Queue,
                    reason: e.to_string(),
                };
            }
        };

        log::debug!(
            "Task {}: {} {} with {} scanner(s)",
            id,
            task.target_type,
            task.target,
            task.scanners.len()
        );

        let mut receiver = match self.resolve_receiver(&task) {
            Ok(receiver) => receiver,
            Err(e) => return self.finish(&mut task, Area::Queue, Err(e)),
        };
        let scanners = match self.resolve_scanners(&task) {
            Ok(scanners) => scanners,
            Err(e) => return self.finish(&mut task, Area::Queue, Err(e)),
        };

        if scanners.is_empty() {
            log::debug!("Task {}: no scanners requested", id);
            return self.finish(&mut task, Area::Queue, Ok(()));
        }

        if let Err(e) = self
            .store
            .transition(&mut task, Area::Queue, TaskStatus::Processing)
        {
            log::error!("Task {}: unable to start processing: {}", id, e);
            return TaskOutcome::Stranded {
                area: Area::Queue,
                reason: e.to_string(),
            };
        }
        log::info!("Task {}: queue -> processing", id);

        let result = process(receiver.as_mut(), &scanners, id).await;

        if let Err(e) = receiver.cleanup().await {
            log::warn!("Task {}: cleanup failed: {}", id, e);
        }

        self.finish(&mut task, Area::Processing, result)
    }

    fn resolve_receiver(&self, task: &Task) -> DispatchResult<Box<dyn TargetReceiver>> {
        let output_dir = self.store.cache_path(&task.id)?;
        let receiver =
            self.receivers
                .get(&task.target_type, &self.config, &task.target, &output_dir)?;
        Ok(receiver)
    }

    fn resolve_scanners(&self, task: &Task) -> DispatchResult<Vec<NamedScanner>> {
        task.scanners
            .iter()
            .map(|name| -> DispatchResult<NamedScanner> {
                let scanner = self.scanners.get(name, &self.config)?;
                Ok((name.clone(), scanner))
            })
            .collect()
    }

    // The single terminal move for a task
    fn finish(&self, task: &mut Task, from: Area, result: DispatchResult<()>) -> TaskOutcome {
        let (status, outcome) = match result {
            Ok(()) => (TaskStatus::Done, TaskOutcome::Done),
            Err(e) => {
                let reason = e.to_string();
                log::error!("Task {} failed: {}", task.id, reason);
                task.error = Some(reason.clone());
                (TaskStatus::Failed, TaskOutcome::Failed(reason))
            }
        };

        match self.store.transition(task, from, status) {
            Ok(to) => {
                log::info!("Task {}: {} -> {}", task.id, from, to);
                outcome
            }
            Err(e) => {
                log::error!("Task {}: unable to move to {}: {}", task.id, status.area(), e);
                TaskOutcome::Stranded {
                    area: from,
                    reason: e.to_string(),
                }
            }
        }
    }
}

async fn process(
    receiver: &mut dyn TargetReceiver,
    scanners: &[NamedScanner],
    id: &str,
) -> DispatchResult<()> {
    receiver.fetch().await?;
    log::debug!("Task {}: fetched", id);

    receiver.snapshot().await?;
    let snapshot = receiver.output_dir().to_path_buf();
    log::debug!("Task {}: snapshot at {}", id, snapshot.display());

    for (name, scanner) in scanners {
        log::debug!("Task {}: running scanner {}", id, name);
        scanner
            .run(&snapshot)
            .await
            .map_err(|source| DispatchError::Scan {
                scanner: name.clone(),
                source,
            })?;
    }
    Ok(())
}
