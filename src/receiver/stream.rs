//! Streaming bridge between an async archive source and the tar extractor
//!
//! The archive is never buffered whole: a producer copies chunks into a
//! bounded in-memory pipe while a blocking consumer extracts from the other
//! end. Both sides run to completion and either side's failure is reported.

use crate::receiver::error::{EngineResult, ReceiverError, ReceiverResult};
use crate::receiver::extract::{extract_archive, ExtractStats};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio_util::io::SyncIoBridge;

/// Bytes held in flight between producer and consumer
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

/// Archive bytes as delivered by a container engine
pub type ChunkStream = BoxStream<'static, EngineResult<Bytes>>;

/// Extract the tar archive carried by `chunks` below `root`.
pub async fn extract_stream(
    mut chunks: ChunkStream,
    root: PathBuf,
    prefix: String,
    capacity: usize,
) -> ReceiverResult<ExtractStats> {
    let (reader, mut writer) = tokio::io::duplex(capacity.max(1));

    let bridge = SyncIoBridge::new(reader);
    let consumer =
        tokio::task::spawn_blocking(move || extract_archive(bridge, &root, &prefix));

    let producer = async move {
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if writer.write_all(&chunk).await.is_err() {
                return Err(ReceiverError::PipeClosed);
            }
        }
        writer
            .shutdown()
            .await
            .map_err(|_| ReceiverError::PipeClosed)
    };

    let (produced, consumed) = tokio::join!(producer, consumer);
    let consumed = consumed.map_err(|e| ReceiverError::Worker(e.to_string()))?;

    match (produced, consumed) {
        (Ok(()), result) => result,
        // the consumer hung up first; its error explains why
        (Err(ReceiverError::PipeClosed), Err(extract)) => Err(extract),
        (Err(produce), _) => Err(produce),
    }
}
