use crate::scanner::error::ScanResult;
use std::path::Path;

/// Inspects a materialized snapshot
///
/// Scanners must not modify the directory they are given.
#[async_trait::async_trait]
pub trait Scanner: Send + Sync {
    async fn run(&self, directory: &Path) -> ScanResult<()>;
}
