//! Common test utilities and helpers
//!
//! An in-memory container engine serving a canned root filesystem export,
//! plus helpers for building a dispatcher over a temporary task store.

use bytes::Bytes;
use futures::StreamExt;
use snapscan::core::config::Configuration;
use snapscan::dispatcher::api::{Dispatcher, TaskSubmitter};
use snapscan::receiver::api::{
    ChunkStream, ContainerEngine, ContainerSpec, DockerImageReceiver, EngineError, EngineResult,
    ImageReference, TargetReceiver, DOCKER_IMAGE,
};
use snapscan::registry::api::{ReceiverRegistry, ScannerRegistry};
use snapscan::store::api::{Area, TaskStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tar::{Builder, EntryType, Header};
use tempfile::TempDir;

/// Image the fake engine knows how to pull
pub const KNOWN_IMAGE: &str = "busybox:latest";

#[derive(Default)]
pub struct FakeEngine {
    rootfs: Vec<u8>,
    containers: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn with_rootfs(rootfs: Vec<u8>) -> Self {
        Self {
            rootfs,
            ..Default::default()
        }
    }

    /// Containers created and not yet removed
    pub fn live_containers(&self) -> Vec<String> {
        let removed = self.removed.lock().unwrap();
        self.containers
            .lock()
            .unwrap()
            .iter()
            .filter(|id| !removed.contains(id))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl ContainerEngine for FakeEngine {
    async fn pull_image(&self, image: &ImageReference) -> EngineResult<()> {
        if image.to_string() == KNOWN_IMAGE {
            Ok(())
        } else {
            Err(EngineError::api(
                "image pull",
                format!("pull access denied for {}", image.name()),
            ))
        }
    }

    async fn create_container(&self, spec: &ContainerSpec) -> EngineResult<String> {
        let mut containers = self.containers.lock().unwrap();
        let id = format!("container-{}-{}", containers.len(), spec.image);
        containers.push(id.clone());
        Ok(id)
    }

    async fn remove_container(&self, id: &str) -> EngineResult<()> {
        self.removed.lock().unwrap().push(id.to_string());
        Ok(())
    }

    fn export_root(&self, _id: &str) -> ChunkStream {
        let chunks: Vec<EngineResult<Bytes>> = self
            .rootfs
            .chunks(512)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        futures::stream::iter(chunks).boxed()
    }
}

/// Root filesystem export of a tiny image
pub fn busybox_rootfs() -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    let mut append = |path: &str, entry_type: EntryType, mode: u32, data: &[u8]| {
        let mut header = Header::new_gnu();
        header.set_entry_type(entry_type);
        header.set_mode(mode);
        header.set_size(data.len() as u64);
        header.set_mtime(1_700_000_000);
        builder.append_data(&mut header, path, data).unwrap();
    };
    append("rootfs/", EntryType::Directory, 0o755, b"");
    append("rootfs/bin/", EntryType::Directory, 0o755, b"");
    append("rootfs/bin/busybox", EntryType::Regular, 0o755, b"\x7fELF");
    append("rootfs/etc/", EntryType::Directory, 0o755, b"");
    append("rootfs/etc/passwd", EntryType::Regular, 0o644, b"root:x:0:0::/root:/bin/sh\n");
    builder.into_inner().unwrap()
}

pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config: Arc<Configuration>,
    pub store: TaskStore,
    pub engine: Arc<FakeEngine>,
    pub receivers: Arc<ReceiverRegistry>,
    pub scanners: Arc<ScannerRegistry>,
}

impl TestEnv {
    /// A store, builtin scanners and a `docker-image` receiver on the fake engine
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Configuration::with_storage_root(temp_dir.path().join("storage"));
        config.tasks.poll_interval_secs = 0;
        let store = TaskStore::from_config(&config);
        store.init().unwrap();

        let engine = Arc::new(FakeEngine::with_rootfs(busybox_rootfs()));
        let mut receivers = ReceiverRegistry::receivers();
        let fake = engine.clone();
        receivers
            .register_receiver(DOCKER_IMAGE, move |_config, target, output_dir| {
                let image = ImageReference::parse(target)?;
                let receiver = DockerImageReceiver::with_engine(image, output_dir, fake.clone());
                Ok(Box::new(receiver) as Box<dyn TargetReceiver>)
            })
            .unwrap();

        Self {
            temp_dir,
            config: Arc::new(config),
            store,
            engine,
            receivers: Arc::new(receivers),
            scanners: Arc::new(ScannerRegistry::with_builtins().unwrap()),
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.config.clone(),
            self.store.clone(),
            self.receivers.clone(),
            self.scanners.clone(),
        )
    }

    pub fn submitter(&self) -> TaskSubmitter {
        TaskSubmitter::new(
            self.store.clone(),
            self.receivers.clone(),
            self.scanners.clone(),
        )
    }

    /// Poll until task `id` reaches `area`, panicking after five seconds
    pub async fn wait_for(&self, id: &str, area: Area) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if self.store.locate(id).unwrap() == Some(area) {
                return;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "task {} never reached {}",
                id,
                area
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
