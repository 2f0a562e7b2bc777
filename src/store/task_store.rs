//! Filesystem-backed task store
//!
//! Layout: `<root>/{new,queue,processing,done,failed,cache}/<task-id>/`,
//! with the serialized record at `<task-dir>/data`. A lifecycle move is a
//! single `rename(2)` of the whole task directory, so an observer sees the
//! task in exactly one area. The store must live on one volume.

use super::area::Area;
use super::error::{StoreError, StoreResult};
use super::task::{Task, TaskStatus};
use crate::core::config::Configuration;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

/// Fixed record filename inside each task directory
pub const TASK_DATA_FILE: &str = "data";

const TASK_DATA_TMP: &str = "data.tmp";

#[derive(Debug, Clone)]
pub struct TaskStore {
    root: PathBuf,
}

impl TaskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &Configuration) -> Self {
        Self::new(config.storage.path.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure every area directory exists. Idempotent.
    pub fn init(&self) -> StoreResult<()> {
        for area in Area::iter() {
            let dir = self.area_path(area);
            fs::create_dir_all(&dir).map_err(|e| StoreError::io("make directory", &dir, e))?;
        }
        Ok(())
    }

    pub fn area_path(&self, area: Area) -> PathBuf {
        self.root.join(area.dir_name())
    }

    /// Path of a task directory. Ids are single path components.
    pub fn task_path(&self, area: Area, id: &str) -> StoreResult<PathBuf> {
        validate_task_id(id)?;
        Ok(self.area_path(area).join(id))
    }

    pub fn task_data_path(&self, area: Area, id: &str) -> StoreResult<PathBuf> {
        Ok(self.task_path(area, id)?.join(TASK_DATA_FILE))
    }

    /// Snapshot of the task ids currently in `area`
    pub fn list_ids(&self, area: Area) -> StoreResult<Vec<String>> {
        let dir = self.area_path(area);
        let entries = fs::read_dir(&dir).map_err(|e| StoreError::io("list", &dir, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io("list", &dir, e))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                log::warn!("Skipping non UTF-8 entry in {}", dir.display());
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            ids.push(name);
        }
        ids.sort();
        Ok(ids)
    }

    pub fn read_task(&self, area: Area, id: &str) -> StoreResult<Task> {
        let path = self.task_data_path(area, id)?;
        let data = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound {
                id: id.to_string(),
                area,
            },
            _ => StoreError::io("read", &path, e),
        })?;
        Task::from_json(&data).map_err(|source| StoreError::Decode { path, source })
    }

    /// Rewrite the record of a task that lives in `area`
    pub fn write_task(&self, area: Area, task: &Task) -> StoreResult<()> {
        let dir = self.task_path(area, &task.id)?;
        let data = task.to_json().map_err(|source| StoreError::Encode {
            id: task.id.clone(),
            source,
        })?;

        let tmp = dir.join(TASK_DATA_TMP);
        let path = dir.join(TASK_DATA_FILE);
        fs::write(&tmp, data).map_err(|e| StoreError::io("write", &tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io("replace", &path, e))
    }

    /// Write a new task into the `new` area. Nothing outside `new` sees it yet.
    pub fn create(&self, task: &Task) -> StoreResult<()> {
        let dir = self.task_path(Area::New, &task.id)?;
        fs::create_dir_all(&dir).map_err(|e| StoreError::io("make directory", &dir, e))?;

        if let Err(e) = self.write_task(Area::New, task) {
            let _ = fs::remove_dir_all(&dir);
            return Err(e);
        }
        Ok(())
    }

    /// Move a task directory between areas with one rename
    pub fn move_task(&self, id: &str, from: Area, to: Area) -> StoreResult<()> {
        let source = self.task_path(from, id)?;
        let destination = self.task_path(to, id)?;
        fs::rename(&source, &destination).map_err(|e| match e.kind() {
            ErrorKind::NotFound if !source.exists() => StoreError::NotFound {
                id: id.to_string(),
                area: from,
            },
            _ => StoreError::io("move", &source, e),
        })?;
        log::debug!("Task {} moved {} -> {}", id, from, to);
        Ok(())
    }

    /// Publish a task from `new` into `queue`; this rename is the point
    /// where the dispatcher can see it
    pub fn publish(&self, id: &str) -> StoreResult<()> {
        self.move_task(id, Area::New, Area::Queue)
    }

    /// Update the status, persist it at the current location, then move the
    /// task to the area that status belongs in
    pub fn transition(&self, task: &mut Task, from: Area, status: TaskStatus) -> StoreResult<Area> {
        let to = status.area();
        task.status = status;
        self.write_task(from, task)?;
        self.move_task(&task.id, from, to)?;
        Ok(to)
    }

    /// Records in `area`, oldest first. Unreadable records are skipped.
    pub fn list(&self, area: Area) -> StoreResult<Vec<Task>> {
        let mut tasks = Vec::new();
        for id in self.list_ids(area)? {
            match self.read_task(area, &id) {
                Ok(task) => tasks.push(task),
                Err(e) => log::warn!("Skipping task {} in {}: {}", id, area, e),
            }
        }
        tasks.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    /// Find the area a task currently lives in
    pub fn locate(&self, id: &str) -> StoreResult<Option<Area>> {
        for area in [Area::New].into_iter().chain(Area::LIFECYCLE) {
            if self.task_path(area, id)?.is_dir() {
                return Ok(Some(area));
            }
        }
        Ok(None)
    }

    /// Per-task snapshot directory
    pub fn cache_path(&self, id: &str) -> StoreResult<PathBuf> {
        self.task_path(Area::Cache, id)
    }

    pub fn remove_cache(&self, id: &str) -> StoreResult<()> {
        let dir = self.cache_path(id)?;
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io("remove", &dir, e)),
        }
    }

    /// Fail tasks a previous process left in `processing`.
    ///
    /// Nothing can resume a half-run task, so each one is marked failed and
    /// its snapshot cache is dropped. Returns the affected ids.
    pub fn recover_interrupted(&self) -> StoreResult<Vec<String>> {
        let mut recovered = Vec::new();
        for id in self.list_ids(Area::Processing)? {
            let mut task = match self.read_task(Area::Processing, &id) {
                Ok(task) => task,
                Err(e) => {
                    log::error!("Unable to read interrupted task {}: {}", id, e);
                    continue;
                }
            };
            task.error = Some("interrupted before completion".to_string());
            if let Err(e) = self.transition(&mut task, Area::Processing, TaskStatus::Failed) {
                log::error!("Unable to fail interrupted task {}: {}", id, e);
                continue;
            }
            if let Err(e) = self.remove_cache(&id) {
                log::warn!("Unable to remove cache for interrupted task {}: {}", id, e);
            }
            log::warn!("Task {} was interrupted and has been marked failed", id);
            recovered.push(id);
        }
        Ok(recovered)
    }
}

fn validate_task_id(id: &str) -> StoreResult<()> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTaskId(id.to_string()))
    }
}
