//! Scanners
//!
//! A scanner inspects a snapshot directory produced by a receiver. Scanners
//! are looked up by name in the scanner registry and run in the order a task
//! lists them.

pub(crate) mod error;
pub(crate) mod filecontent;
pub(crate) mod traits;

// Public API module - the only public interface for scanners
pub mod api;
