//! Test modules for the task store
//!
//! Organised by functional area: layout and paths, state transitions, and
//! listing/recovery.


use crate::store::api::TaskStore;
use tempfile::TempDir;

/// Initialised store rooted in a fresh temporary directory
pub(super) fn temp_store() -> (TempDir, TaskStore) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let store = TaskStore::new(temp_dir.path().join("storage"));
    store.init().expect("init store");
    (temp_dir, store)
}
