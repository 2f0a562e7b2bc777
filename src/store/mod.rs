//! Task Store
//!
//! Durable, directory-based job queue. Each task is a directory holding one
//! serialized record; its lifecycle position is the area directory it sits
//! in, and every transition is a rename between areas.

pub(crate) mod area;
pub(crate) mod error;
pub(crate) mod task;
pub(crate) mod task_store;

// Public API module - the only public interface for the task store
pub mod api;

#[cfg(test)]
mod tests;
