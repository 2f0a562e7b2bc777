//! Receiver API

pub use crate::receiver::docker::engine::{ContainerEngine, ContainerSpec, DockerEngine};
pub use crate::receiver::docker::reference::ImageReference;
pub use crate::receiver::docker::{DockerImageReceiver, RECEIVER_NAME as DOCKER_IMAGE, ROOTFS_PREFIX};
pub use crate::receiver::error::{EngineError, EngineResult, ReceiverError, ReceiverResult};
pub use crate::receiver::extract::{extract_archive, ExtractStats};
pub use crate::receiver::stream::{extract_stream, ChunkStream, DEFAULT_PIPE_CAPACITY};
pub use crate::receiver::traits::TargetReceiver;
