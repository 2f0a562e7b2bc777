//! Task record persisted as `<area>/<id>/data`

use super::area::Area;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

/// Lifecycle status recorded inside the task record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    Queue,
    Processing,
    Done,
    Failed,
}

impl TaskStatus {
    /// The area a task with this status belongs in
    pub fn area(&self) -> Area {
        match self {
            TaskStatus::Queue => Area::Queue,
            TaskStatus::Processing => Area::Processing,
            TaskStatus::Done => Area::Done,
            TaskStatus::Failed => Area::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }
}

/// A unit of scan work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub created: DateTime<Utc>,
    pub status: TaskStatus,
    /// Receiver registry key
    #[serde(rename = "type")]
    pub target_type: String,
    /// Receiver-specific target descriptor
    pub target: String,
    /// Scanner registry keys, run in this order
    #[serde(default)]
    pub scanners: Vec<String>,
    /// Reason for the `failed` transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    /// Create a queued task with a fresh id
    pub fn new(
        target_type: impl Into<String>,
        target: impl Into<String>,
        scanners: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created: Utc::now(),
            status: TaskStatus::Queue,
            target_type: target_type.into(),
            target: target.into(),
            scanners,
            error: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_json(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}
