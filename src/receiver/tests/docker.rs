//! Tests for the image receiver against a scripted engine

use super::sample_rootfs;
use crate::receiver::api::{
    ChunkStream, ContainerEngine, ContainerSpec, DockerImageReceiver, EngineError, EngineResult,
    ImageReference, ReceiverError, TargetReceiver,
};
use bytes::Bytes;
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct ScriptedEngine {
    archive: Vec<u8>,
    fail_pull: bool,
    fail_create: bool,
    fail_export: bool,
    fail_remove: bool,
    calls: Mutex<Vec<String>>,
    specs: Mutex<Vec<ContainerSpec>>,
}

impl ScriptedEngine {
    fn with_archive(archive: Vec<u8>) -> Self {
        Self {
            archive,
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl ContainerEngine for ScriptedEngine {
    async fn pull_image(&self, image: &ImageReference) -> EngineResult<()> {
        self.record(format!("pull {}", image));
        if self.fail_pull {
            return Err(EngineError::api("image pull", "manifest unknown"));
        }
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> EngineResult<String> {
        self.record(format!("create {}", spec.image));
        self.specs.lock().unwrap().push(spec.clone());
        if self.fail_create {
            return Err(EngineError::api("container create", "no such image"));
        }
        Ok("c0ffee".to_string())
    }

    async fn remove_container(&self, id: &str) -> EngineResult<()> {
        self.record(format!("remove {}", id));
        if self.fail_remove {
            return Err(EngineError::api("container remove", "daemon busy"));
        }
        Ok(())
    }

    fn export_root(&self, id: &str) -> ChunkStream {
        self.record(format!("export {}", id));
        let mut chunks: Vec<EngineResult<Bytes>> = self
            .archive
            .chunks(300)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        if self.fail_export {
            chunks.truncate(2);
            chunks.push(Err(EngineError::api("container export", "unexpected EOF")));
        }
        futures::stream::iter(chunks).boxed()
    }
}

fn receiver(engine: &Arc<ScriptedEngine>, out: &std::path::Path) -> DockerImageReceiver {
    DockerImageReceiver::with_engine(
        ImageReference::parse("busybox:latest").unwrap(),
        out,
        engine.clone(),
    )
}

#[tokio::test]
async fn test_fetch_pulls_the_image() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(ScriptedEngine::default());

    receiver(&engine, temp_dir.path()).fetch().await.unwrap();

    assert_eq!(engine.calls(), vec!["pull busybox:latest"]);
}

#[tokio::test]
async fn test_fetch_failure_names_the_target() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(ScriptedEngine {
        fail_pull: true,
        ..Default::default()
    });

    let err = receiver(&engine, temp_dir.path()).fetch().await.unwrap_err();

    assert!(matches!(err, ReceiverError::Fetch { .. }));
    assert!(err.to_string().contains("busybox:latest"));
}

#[tokio::test]
async fn test_snapshot_materializes_and_removes_container() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("cache/task");
    let engine = Arc::new(ScriptedEngine::with_archive(sample_rootfs()));
    let mut receiver = receiver(&engine, &out).with_pipe_capacity(97);

    receiver.snapshot().await.unwrap();

    assert_eq!(std::fs::read(out.join("bin/busybox")).unwrap(), b"\x7fELF");
    assert_eq!(
        engine.calls(),
        vec!["create busybox:latest", "export c0ffee", "remove c0ffee"]
    );
    let specs = engine.specs.lock().unwrap();
    assert_eq!(specs[0], ContainerSpec::inert("busybox:latest"));
    assert_eq!(specs[0].entrypoint, vec![String::new()]);
}

#[tokio::test]
async fn test_container_is_removed_when_export_fails() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(ScriptedEngine {
        archive: sample_rootfs(),
        fail_export: true,
        ..Default::default()
    });
    let mut receiver = receiver(&engine, temp_dir.path());

    let err = receiver.snapshot().await.unwrap_err();

    assert!(matches!(err, ReceiverError::Snapshot { .. }));
    assert_eq!(engine.calls().last().map(String::as_str), Some("remove c0ffee"));
}

#[tokio::test]
async fn test_create_failure_skips_removal() {
    let temp_dir = TempDir::new().unwrap();
    let engine = Arc::new(ScriptedEngine {
        fail_create: true,
        ..Default::default()
    });
    let mut receiver = receiver(&engine, temp_dir.path());

    let err = receiver.snapshot().await.unwrap_err();

    assert!(err.to_string().contains("no such image"));
    assert_eq!(engine.calls(), vec!["create busybox:latest"]);
}

#[tokio::test]
async fn test_cleanup_retries_a_failed_release() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("snapshot");
    let engine = Arc::new(ScriptedEngine {
        archive: sample_rootfs(),
        fail_remove: true,
        ..Default::default()
    });
    let mut receiver = receiver(&engine, &out);

    receiver.snapshot().await.unwrap();
    receiver.cleanup().await.unwrap();

    let removals = engine
        .calls()
        .into_iter()
        .filter(|c| c.starts_with("remove"))
        .count();
    assert_eq!(removals, 2);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_cleanup_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("snapshot");
    let engine = Arc::new(ScriptedEngine::with_archive(sample_rootfs()));
    let mut receiver = receiver(&engine, &out);

    // nothing created yet
    receiver.cleanup().await.unwrap();

    receiver.snapshot().await.unwrap();
    assert!(out.is_dir());
    receiver.cleanup().await.unwrap();
    receiver.cleanup().await.unwrap();

    assert!(!out.exists());
}
