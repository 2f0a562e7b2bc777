//! Filesystem walk scanner
//!
//! Visits every entry below the snapshot root and logs its path. Symlinks are
//! reported but never followed.

use crate::core::config::Configuration;
use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::traits::Scanner;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SCANNER_NAME: &str = "filecontent";

crate::builtin_scanner!(SCANNER_NAME, FileContentScanner::create);

#[derive(Debug, Default, Clone)]
pub struct FileContentScanner;

impl FileContentScanner {
    pub fn new() -> Self {
        Self
    }

    /// Registry constructor
    pub fn create(_config: &Configuration) -> ScanResult<Box<dyn Scanner>> {
        Ok(Box::new(Self::new()))
    }
}

/// Collect every path below `directory`, the directory itself first.
///
/// Entries that cannot be read are logged and left out; only a missing
/// root fails the walk.
pub fn walk(directory: &Path) -> ScanResult<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(ScanError::MissingDirectory(directory.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => paths.push(entry.into_path()),
            Err(e) => log::warn!(
                "{}: skipping unreadable entry below {}: {}",
                SCANNER_NAME,
                directory.display(),
                e
            ),
        }
    }
    Ok(paths)
}

#[async_trait::async_trait]
impl Scanner for FileContentScanner {
    async fn run(&self, directory: &Path) -> ScanResult<()> {
        let root = directory.to_path_buf();
        let paths = tokio::task::spawn_blocking(move || walk(&root))
            .await
            .map_err(|e| ScanError::Failed {
                message: e.to_string(),
            })??;

        for path in &paths {
            log::info!("{}: {}", SCANNER_NAME, path.display());
        }
        log::debug!(
            "{}: visited {} entries below {}",
            SCANNER_NAME,
            paths.len(),
            directory.display()
        );
        Ok(())
    }
}
