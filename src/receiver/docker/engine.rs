//! Container engine seam
//!
//! [`ContainerEngine`] covers the four operations the image receiver needs.
//! [`DockerEngine`] implements it against a Docker daemon through `bollard`.

use crate::core::config::DockerConfig;
use crate::receiver::docker::reference::ImageReference;
use crate::receiver::error::{EngineError, EngineResult};
use crate::receiver::stream::ChunkStream;
use bollard::container::{
    Config, CreateContainerOptions, DownloadFromContainerOptions, RemoveContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::{Docker, API_DEFAULT_VERSION};
use futures::{StreamExt, TryStreamExt};

/// Container creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub entrypoint: Vec<String>,
    pub cmd: Vec<String>,
}

impl ContainerSpec {
    /// A container that is created only to be exported and never started
    pub fn inert(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            entrypoint: vec![String::new()],
            cmd: vec![String::new()],
        }
    }
}

#[async_trait::async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Pull `image` and wait for the pull to finish
    async fn pull_image(&self, image: &ImageReference) -> EngineResult<()>;

    /// Create (but do not start) a container, returning its id
    async fn create_container(&self, spec: &ContainerSpec) -> EngineResult<String>;

    /// Force-remove a container
    async fn remove_container(&self, id: &str) -> EngineResult<()>;

    /// Stream the container's root filesystem as a tar archive
    fn export_root(&self, id: &str) -> ChunkStream;
}

#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Build a client for the configured daemon address.
    ///
    /// No request is made here; an unreachable daemon surfaces on the first
    /// operation.
    pub fn connect(config: &DockerConfig) -> EngineResult<Self> {
        let timeout = config.timeout_secs;
        let address = config.addr.as_deref().unwrap_or_default();

        let connected = if address.is_empty() {
            Docker::connect_with_local_defaults()
        } else if address.starts_with("unix://") {
            Docker::connect_with_unix(address, timeout, API_DEFAULT_VERSION)
        } else if address.starts_with("tcp://") || address.starts_with("http://") {
            Docker::connect_with_http(address, timeout, API_DEFAULT_VERSION)
        } else {
            return Err(EngineError::Connection {
                address: address.to_string(),
                message: "unsupported scheme (expected unix://, tcp:// or http://)".to_string(),
            });
        };

        match connected {
            Ok(docker) => Ok(Self { docker }),
            Err(e) => Err(EngineError::Connection {
                address: if address.is_empty() {
                    "local default".to_string()
                } else {
                    address.to_string()
                },
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl ContainerEngine for DockerEngine {
    async fn pull_image(&self, image: &ImageReference) -> EngineResult<()> {
        let image = image.pinned();
        let options = match image.digest() {
            Some(_) => CreateImageOptions {
                from_image: image.to_string(),
                ..Default::default()
            },
            None => CreateImageOptions {
                from_image: image.name().to_string(),
                tag: image.tag().unwrap_or_default().to_string(),
                ..Default::default()
            },
        };

        let mut progress = self.docker.create_image(Some(options), None, None);
        while let Some(update) = progress.next().await {
            let update = update.map_err(|e| EngineError::api("image pull", e))?;
            if let Some(status) = update.status {
                log::trace!("pull {}: {}", image, status);
            }
        }
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> EngineResult<String> {
        let config = Config {
            image: Some(spec.image.clone()),
            entrypoint: Some(spec.entrypoint.clone()),
            cmd: Some(spec.cmd.clone()),
            ..Default::default()
        };
        let response = self
            .docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await
            .map_err(|e| EngineError::api("container create", e))?;

        for warning in &response.warnings {
            log::warn!("container create: {}", warning);
        }
        Ok(response.id)
    }

    async fn remove_container(&self, id: &str) -> EngineResult<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| EngineError::api("container remove", e))
    }

    fn export_root(&self, id: &str) -> ChunkStream {
        let options = DownloadFromContainerOptions {
            path: "/".to_string(),
        };
        self.docker
            .download_from_container(id, Some(options))
            .map_err(|e| EngineError::api("container export", e))
            .boxed()
    }
}
