//! Task creation
//!
//! Validates a request against the registries, writes the record into `new`
//! and publishes it into `queue`. The rename into `queue` is the point at
//! which the dispatcher can see the task.

use crate::dispatcher::error::{DispatchError, DispatchResult};
use crate::dispatcher::signal::WakeSignal;
use crate::registry::api::{ReceiverRegistry, ScannerRegistry};
use crate::store::api::{Area, Task, TaskStore};
use std::sync::Arc;

/// What a caller asks to have scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub target_type: String,
    pub target: String,
    pub scanners: Vec<String>,
}

impl TaskRequest {
    pub fn new(
        target_type: impl Into<String>,
        target: impl Into<String>,
        scanners: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            target_type: target_type.into(),
            target: target.into(),
            scanners: scanners.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskSubmitter {
    store: TaskStore,
    receivers: Arc<ReceiverRegistry>,
    scanners: Arc<ScannerRegistry>,
    signal: Option<WakeSignal>,
}

impl TaskSubmitter {
    pub fn new(
        store: TaskStore,
        receivers: Arc<ReceiverRegistry>,
        scanners: Arc<ScannerRegistry>,
    ) -> Self {
        Self {
            store,
            receivers,
            scanners,
            signal: None,
        }
    }

    /// Wake this dispatcher after each published task
    pub fn with_signal(mut self, signal: WakeSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn validate(&self, request: &TaskRequest) -> DispatchResult<()> {
        let target_type = request.target_type.trim();
        if target_type.is_empty() {
            return Err(DispatchError::EmptyType);
        }
        if !self.receivers.contains(target_type) {
            return Err(DispatchError::UnknownType {
                name: target_type.to_string(),
                expected: self.receivers.list(),
            });
        }
        if request.target.trim().is_empty() {
            return Err(DispatchError::EmptyTarget);
        }
        if let Some(unknown) = request
            .scanners
            .iter()
            .find(|name| !self.scanners.contains(name))
        {
            return Err(DispatchError::UnknownScanner {
                name: unknown.clone(),
                expected: self.scanners.list(),
            });
        }
        Ok(())
    }

    /// Create and publish a task, returning the queued record
    pub fn submit(&self, request: TaskRequest) -> DispatchResult<Task> {
        self.validate(&request)?;

        let task = Task::new(
            request.target_type.trim(),
            request.target.trim(),
            request.scanners,
        );
        self.store.create(&task)?;

        if let Err(e) = self.store.publish(&task.id) {
            self.discard(&task.id);
            return Err(e.into());
        }
        log::info!(
            "Task {} queued: {} {}",
            task.id,
            task.target_type,
            task.target
        );

        if let Some(signal) = &self.signal {
            signal.notify();
        }
        Ok(task)
    }

    fn discard(&self, id: &str) {
        let Ok(path) = self.store.task_path(Area::New, id) else {
            return;
        };
        if let Err(e) = std::fs::remove_dir_all(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Unable to remove unpublished task {}: {}", id, e);
            }
        }
    }
}
