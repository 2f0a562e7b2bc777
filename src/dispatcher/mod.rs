//! Dispatcher
//!
//! Single control loop that polls the `queue` area and hands each task to an
//! independently scheduled worker running the task pipeline. The loop is
//! woken by [`WakeSignal`](api::WakeSignal) when new work is published and,
//! optionally, by a periodic re-poll.

pub(crate) mod control;
pub(crate) mod error;
pub(crate) mod pipeline;
pub(crate) mod signal;
pub(crate) mod submit;

// Public API module - the only public interface for the dispatcher
pub mod api;

#[cfg(test)]
mod tests;
