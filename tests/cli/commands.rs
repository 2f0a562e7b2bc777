//! Subcommands against a configuration file on disk

use snapscan::app::commands;
use snapscan::app::error::AppError;
use snapscan::core::config::Configuration;
use snapscan::dispatcher::api::TaskRequest;
use snapscan::store::api::{Area, TaskStatus};
use tempfile::TempDir;

fn load_config(temp_dir: &TempDir) -> Configuration {
    let path = temp_dir.path().join("snapscan.toml");
    let contents = format!(
        "version = \"1.0\"\n\n[storage]\npath = \"{}\"\n\n[tasks]\nmax-concurrent = 2\n",
        temp_dir.path().join("storage").display()
    );
    std::fs::write(&path, contents).unwrap();
    Configuration::from_file(&path).unwrap()
}

#[test]
fn test_builtin_registries_list_defaults() {
    let (receivers, scanners) = commands::builtin_registries().unwrap();
    assert_eq!(receivers.list(), vec!["docker-image".to_string()]);
    assert!(scanners.list().contains(&"filecontent".to_string()));
    assert_eq!(
        commands::render_names("receiver", &receivers.list()),
        "  docker-image"
    );
}

#[test]
fn test_submitted_task_is_listed_and_shown() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_config(&temp_dir);

    let task = commands::submit(
        &config,
        TaskRequest::new(" docker-image ", " busybox:latest ", ["filecontent"]),
    )
    .unwrap();
    assert_eq!(task.target_type, "docker-image");
    assert_eq!(task.target, "busybox:latest");
    assert_eq!(task.status, TaskStatus::Queue);

    let listed = commands::list(&config, Some(Area::Queue)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].1.id, task.id);

    let rendered = commands::render_list(&listed, false);
    assert!(rendered.contains("busybox:latest"));
    assert!(rendered.contains("queue"));

    let (area, shown) = commands::show(&config, &task.id).unwrap();
    assert_eq!(area, Area::Queue);
    assert_eq!(shown.scanners, vec!["filecontent".to_string()]);
}

#[test]
fn test_submit_rejects_unknown_scanner() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_config(&temp_dir);

    let err = commands::submit(
        &config,
        TaskRequest::new("docker-image", "busybox:latest", ["antivirus"]),
    )
    .unwrap_err();

    assert!(matches!(err, AppError::Dispatch(_)));
    assert!(err.to_string().contains("antivirus"));
    assert!(commands::list(&config, None).unwrap().is_empty());
}

#[test]
fn test_empty_store_renders_placeholder() {
    let temp_dir = TempDir::new().unwrap();
    let config = load_config(&temp_dir);
    let tasks = commands::list(&config, None).unwrap();
    assert_eq!(commands::render_list(&tasks, false), "No tasks.");
}
