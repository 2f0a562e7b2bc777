//! Dispatcher API

pub use crate::dispatcher::control::Dispatcher;
pub use crate::dispatcher::error::{DispatchError, DispatchResult};
pub use crate::dispatcher::pipeline::{TaskOutcome, TaskRunner};
pub use crate::dispatcher::signal::WakeSignal;
pub use crate::dispatcher::submit::{TaskRequest, TaskSubmitter};
