//! Receiver and Scanner Registries
//!
//! Name-to-constructor tables. Registries are ordinary values built once at
//! startup (normally from the builtin entries collected at link time) and
//! then shared read-only with the dispatcher.

pub(crate) mod builtin;
pub(crate) mod error;
pub(crate) mod generic;
pub(crate) mod kinds;

// Public API module - the only public interface for registries
pub mod api;
