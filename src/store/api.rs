//! Task Store API
//!
//! Public surface of the task store: areas, the task record and the
//! filesystem store itself.

pub use crate::store::area::Area;
pub use crate::store::error::{StoreError, StoreResult};
pub use crate::store::task::{Task, TaskStatus};
pub use crate::store::task_store::{TaskStore, TASK_DATA_FILE};
