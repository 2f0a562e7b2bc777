//! Container image receiver
//!
//! Pulls an image, creates a never-started container from it and streams the
//! container's root filesystem into the task's cache directory.

pub(crate) mod engine;
pub(crate) mod reference;

use crate::core::config::Configuration;
use crate::receiver::docker::engine::{ContainerEngine, ContainerSpec, DockerEngine};
use crate::receiver::docker::reference::ImageReference;
use crate::receiver::error::{ReceiverError, ReceiverResult};
use crate::receiver::stream::{extract_stream, DEFAULT_PIPE_CAPACITY};
use crate::receiver::traits::TargetReceiver;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const RECEIVER_NAME: &str = "docker-image";

/// Leading directory of every entry in a root filesystem export
pub const ROOTFS_PREFIX: &str = "rootfs/";

crate::builtin_receiver!(RECEIVER_NAME, DockerImageReceiver::create);

pub struct DockerImageReceiver {
    image: ImageReference,
    output_dir: PathBuf,
    engine: Arc<dyn ContainerEngine>,
    pipe_capacity: usize,
    /// Container awaiting removal, if a release failed
    container: Option<String>,
}

impl std::fmt::Debug for DockerImageReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerImageReceiver")
            .field("image", &self.image.to_string())
            .field("output_dir", &self.output_dir)
            .field("container", &self.container)
            .finish()
    }
}

impl DockerImageReceiver {
    /// Registry constructor: parses the target and connects to the daemon
    pub fn create(
        config: &Configuration,
        target: &str,
        output_dir: &Path,
    ) -> ReceiverResult<Box<dyn TargetReceiver>> {
        let image = ImageReference::parse(target)?;
        let engine = DockerEngine::connect(&config.docker)?;
        Ok(Box::new(Self::with_engine(image, output_dir, Arc::new(engine))))
    }

    pub fn with_engine(
        image: ImageReference,
        output_dir: &Path,
        engine: Arc<dyn ContainerEngine>,
    ) -> Self {
        Self {
            image,
            output_dir: output_dir.to_path_buf(),
            engine,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            container: None,
        }
    }

    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity;
        self
    }

    pub fn image(&self) -> &ImageReference {
        &self.image
    }

    async fn export_into_output(&self, container: &str) -> ReceiverResult<()> {
        let stats = extract_stream(
            self.engine.export_root(container),
            self.output_dir.clone(),
            ROOTFS_PREFIX.to_string(),
            self.pipe_capacity,
        )
        .await?;
        log::debug!(
            "{}: extracted {} directories, {} files, {} symlinks, {} hard links ({} skipped)",
            self.image,
            stats.directories,
            stats.files,
            stats.symlinks,
            stats.hard_links,
            stats.skipped
        );
        Ok(())
    }

    async fn release_container(&mut self) {
        let Some(container) = self.container.take() else {
            return;
        };
        match self.engine.remove_container(&container).await {
            Ok(()) => log::debug!("{}: removed container {}", self.image, container),
            Err(e) => {
                log::warn!(
                    "{}: unable to remove container {}: {}",
                    self.image,
                    container,
                    e
                );
                self.container = Some(container);
            }
        }
    }
}

#[async_trait::async_trait]
impl TargetReceiver for DockerImageReceiver {
    async fn fetch(&mut self) -> ReceiverResult<()> {
        log::info!("Pulling {}", self.image);
        self.engine
            .pull_image(&self.image)
            .await
            .map_err(|source| ReceiverError::Fetch {
                target: self.image.to_string(),
                source,
            })
    }

    async fn snapshot(&mut self) -> ReceiverResult<()> {
        let snapshot_error = |source: ReceiverError, image: &ImageReference| {
            ReceiverError::Snapshot {
                target: image.to_string(),
                source: Box::new(source),
            }
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(ReceiverError::io("create", &self.output_dir))
            .map_err(|e| snapshot_error(e, &self.image))?;

        let spec = ContainerSpec::inert(self.image.to_string());
        let container = self
            .engine
            .create_container(&spec)
            .await
            .map_err(|e| snapshot_error(e.into(), &self.image))?;
        log::debug!("{}: created container {}", self.image, container);
        self.container = Some(container.clone());

        let exported = self.export_into_output(&container).await;
        self.release_container().await;

        exported.map_err(|e| snapshot_error(e, &self.image))
    }

    async fn cleanup(&mut self) -> ReceiverResult<()> {
        self.release_container().await;
        match tokio::fs::remove_dir_all(&self.output_dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ReceiverError::io("remove", &self.output_dir)(e)),
        }
    }

    fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
