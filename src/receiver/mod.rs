//! Target Receivers
//!
//! A receiver turns a task target into a directory tree on local disk:
//! `fetch` makes the target available, `snapshot` materializes its
//! filesystem into the task's cache directory and `cleanup` removes whatever
//! the receiver left behind.

pub(crate) mod docker;
pub(crate) mod error;
pub(crate) mod extract;
pub(crate) mod stream;
pub(crate) mod traits;

// Public API module - the only public interface for receivers
pub mod api;

#[cfg(test)]
mod tests;
