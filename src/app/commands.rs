//! Subcommand implementations

use crate::app::cli::display::{name_list, task_header, task_line};
use crate::app::error::{AppError, AppResult};
use crate::core::config::Configuration;
use crate::core::shutdown::ShutdownCoordinator;
use crate::dispatcher::api::{Dispatcher, TaskRequest, TaskSubmitter};
use crate::registry::api::{ReceiverRegistry, ScannerRegistry};
use crate::store::api::{Area, Task, TaskStore};
use std::sync::Arc;

/// Registries holding every builtin receiver and scanner
pub fn builtin_registries() -> AppResult<(Arc<ReceiverRegistry>, Arc<ScannerRegistry>)> {
    let receivers = ReceiverRegistry::with_builtins()?;
    let scanners = ScannerRegistry::with_builtins()?;
    Ok((Arc::new(receivers), Arc::new(scanners)))
}

fn open_store(config: &Configuration) -> AppResult<TaskStore> {
    let store = TaskStore::from_config(config);
    store.init()?;
    Ok(store)
}

/// Recover interrupted work, then dispatch until a shutdown signal
pub async fn serve(config: Configuration) -> AppResult<()> {
    let store = open_store(&config)?;

    let recovered = store.recover_interrupted()?;
    if !recovered.is_empty() {
        log::warn!("Marked {} interrupted task(s) as failed", recovered.len());
    }

    let (receivers, scanners) = builtin_registries()?;
    log::info!("Receivers: {}", receivers.list().join(", "));
    log::info!("Scanners: {}", scanners.list().join(", "));

    let (coordinator, shutdown) = ShutdownCoordinator::new();
    coordinator.install_signal_handlers();

    let dispatcher = Dispatcher::new(Arc::new(config), store, receivers, scanners);
    dispatcher.run_until(shutdown).await?;
    Ok(())
}

/// Validate and queue a task; a running `serve` picks it up on its next poll
pub fn submit(config: &Configuration, request: TaskRequest) -> AppResult<Task> {
    let store = open_store(config)?;
    let (receivers, scanners) = builtin_registries()?;
    let task = TaskSubmitter::new(store, receivers, scanners).submit(request)?;
    Ok(task)
}

/// Tasks with their areas, oldest first
pub fn list(config: &Configuration, area: Option<Area>) -> AppResult<Vec<(Area, Task)>> {
    let store = open_store(config)?;
    let areas: Vec<Area> = match area {
        Some(area) => vec![area],
        None => std::iter::once(Area::New).chain(Area::LIFECYCLE).collect(),
    };

    let mut tasks = Vec::new();
    for area in areas {
        tasks.extend(store.list(area)?.into_iter().map(|task| (area, task)));
    }
    tasks.sort_by(|(_, a), (_, b)| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
    Ok(tasks)
}

/// The record of task `id` and the area it was found in
pub fn show(config: &Configuration, id: &str) -> AppResult<(Area, Task)> {
    let store = open_store(config)?;
    let area = store
        .locate(id)?
        .ok_or_else(|| AppError::TaskNotFound(id.to_string()))?;
    Ok((area, store.read_task(area, id)?))
}

pub fn render_list(tasks: &[(Area, Task)], use_color: bool) -> String {
    if tasks.is_empty() {
        return "No tasks.".to_string();
    }
    let mut lines = vec![task_header(use_color)];
    lines.extend(tasks.iter().map(|(area, task)| task_line(task, *area, use_color)));
    lines.join("\n")
}

pub fn render_task(area: Area, task: &Task) -> AppResult<String> {
    let record = serde_json::to_string_pretty(task)?;
    Ok(format!("area: {}\n{}", area, record))
}

pub fn render_names(kind: &str, names: &[String]) -> String {
    name_list(kind, names)
}
