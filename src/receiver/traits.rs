use crate::receiver::error::ReceiverResult;
use std::path::Path;

/// Materializes one task target on local disk
///
/// A receiver is bound to a single target and output directory when it is
/// constructed. The pipeline calls `fetch`, then `snapshot`, and always calls
/// `cleanup` once processing has started, whatever the outcome.
#[async_trait::async_trait]
pub trait TargetReceiver: Send {
    /// Make the target locally available (for images, pull it)
    async fn fetch(&mut self) -> ReceiverResult<()>;

    /// Write the target's filesystem into [`output_dir`](Self::output_dir)
    async fn snapshot(&mut self) -> ReceiverResult<()>;

    /// Remove the output directory and any leftover resources.
    ///
    /// Must succeed when nothing was created and when called twice.
    async fn cleanup(&mut self) -> ReceiverResult<()>;

    fn output_dir(&self) -> &Path;
}
