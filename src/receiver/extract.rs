//! Tar extraction into a snapshot directory
//!
//! Entries are written below the output root after an optional leading
//! prefix is stripped from their names. Only directories, regular files,
//! symbolic links and hard links are materialized; device nodes, FIFOs and
//! other special entries are skipped. Every written file gets owner
//! read/write permission on top of its archived mode so scanners are never
//! locked out.

use crate::receiver::error::{ReceiverError, ReceiverResult};
use std::fs::{self, File, FileTimes, OpenOptions, Permissions};
use std::io::{self, Read};
use std::os::unix::fs::{symlink, OpenOptionsExt, PermissionsExt};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tar::{Archive, EntryType, Header};

/// Permission bits added to every extracted regular file
pub const OWNER_READ_WRITE: u32 = 0o600;

// Directories also need the search bit or their contents are unreachable
const OWNER_DIRECTORY: u32 = 0o700;

const MODE_MASK: u32 = 0o7777;

/// Counts of what an extraction wrote
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub directories: usize,
    pub files: usize,
    pub symlinks: usize,
    pub hard_links: usize,
    pub skipped: usize,
}

/// Extract a tar stream below `root`, stripping `prefix` from entry names.
///
/// The reader is drained to EOF once the archive ends so a streaming writer
/// on the other side never blocks on trailing padding.
pub fn extract_archive<R: Read>(
    reader: R,
    root: &Path,
    prefix: &str,
) -> ReceiverResult<ExtractStats> {
    fs::create_dir_all(root).map_err(ReceiverError::io("create", root))?;

    let prefix = Path::new(prefix.trim_end_matches('/'));
    let mut stats = ExtractStats::default();
    let mut archive = Archive::new(reader);

    {
        let entries = archive
            .entries()
            .map_err(ReceiverError::io("read archive for", root))?;

        for entry in entries {
            let mut entry = entry.map_err(ReceiverError::io("read archive entry for", root))?;
            let header = entry.header().clone();
            let raw_path = entry
                .path()
                .map_err(ReceiverError::io("decode entry name for", root))?
                .into_owned();

            let Some(relative) = relative_entry_path(&raw_path, prefix) else {
                log::warn!("Skipping archive entry outside the snapshot: {}", raw_path.display());
                stats.skipped += 1;
                continue;
            };
            let destination = root.join(&relative);
            if !parents_are_real_directories(root, &relative) {
                log::warn!(
                    "Skipping archive entry below a symbolic link: {}",
                    raw_path.display()
                );
                stats.skipped += 1;
                continue;
            }

            let mode = header.mode().unwrap_or(0o644) & MODE_MASK;

            match header.entry_type() {
                EntryType::Directory => {
                    write_directory(&destination, mode | OWNER_DIRECTORY)?;
                    apply_times(&destination, &header);
                    stats.directories += 1;
                }
                EntryType::Regular | EntryType::Continuous => {
                    write_file(&mut entry, &destination, mode | OWNER_READ_WRITE)?;
                    apply_times(&destination, &header);
                    stats.files += 1;
                }
                EntryType::Symlink => {
                    let target = entry
                        .link_name()
                        .map_err(ReceiverError::io("decode link target for", &destination))?
                        .ok_or_else(|| missing_link_target(&destination))?
                        .into_owned();
                    write_symlink(&target, &destination)?;
                    stats.symlinks += 1;
                }
                EntryType::Link => {
                    let target = entry
                        .link_name()
                        .map_err(ReceiverError::io("decode link target for", &destination))?
                        .ok_or_else(|| missing_link_target(&destination))?
                        .into_owned();
                    let Some(target) = relative_entry_path(&target, prefix)
                        .filter(|target| is_contained_link_target(root, target))
                    else {
                        log::warn!(
                            "Skipping hard link to a path outside the snapshot: {}",
                            raw_path.display()
                        );
                        stats.skipped += 1;
                        continue;
                    };
                    write_hard_link(&root.join(target), &destination)?;
                    stats.hard_links += 1;
                }
                other => {
                    log::debug!("Skipping {:?} entry {}", other, raw_path.display());
                    stats.skipped += 1;
                }
            }
        }
    }

    let mut rest = archive.into_inner();
    io::copy(&mut rest, &mut io::sink()).map_err(ReceiverError::io("drain archive for", root))?;

    Ok(stats)
}

/// Entry name relative to the output root, or `None` if it would escape it
fn relative_entry_path(raw: &Path, prefix: &Path) -> Option<PathBuf> {
    let stripped = if prefix.as_os_str().is_empty() {
        raw
    } else {
        raw.strip_prefix(prefix).unwrap_or(raw)
    };

    let mut relative = PathBuf::new();
    for component in stripped.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

// An earlier symlink entry must not redirect later entries outside the root
fn parents_are_real_directories(root: &Path, relative: &Path) -> bool {
    let mut current = root.to_path_buf();
    let mut components = relative.components().peekable();
    while let Some(component) = components.next() {
        if components.peek().is_none() {
            break;
        }
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(metadata) if metadata.file_type().is_symlink() => return false,
            _ => {}
        }
    }
    true
}

// A hard link may only name an existing non-symlink reached through real directories
fn is_contained_link_target(root: &Path, target: &Path) -> bool {
    if target.as_os_str().is_empty() || !parents_are_real_directories(root, target) {
        return false;
    }
    match fs::symlink_metadata(root.join(target)) {
        Ok(metadata) => !metadata.file_type().is_symlink() && !metadata.is_dir(),
        Err(_) => false,
    }
}

fn ensure_parent(path: &Path) -> ReceiverResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ReceiverError::io("create", parent))?;
    }
    Ok(())
}

fn write_directory(path: &Path, mode: u32) -> ReceiverResult<()> {
    ensure_parent(path)?;
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            // never chmod through a link planted by an earlier entry
            fs::remove_file(path).map_err(ReceiverError::io("replace", path))?;
            fs::create_dir(path).map_err(ReceiverError::io("create", path))?;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir(path).map_err(ReceiverError::io("create", path))?;
        }
        Err(e) => return Err(ReceiverError::io("inspect", path)(e)),
    }
    fs::set_permissions(path, Permissions::from_mode(mode))
        .map_err(ReceiverError::io("set permissions on", path))
}

fn write_file<R: Read>(entry: &mut R, path: &Path, mode: u32) -> ReceiverResult<()> {
    ensure_parent(path)?;
    remove_existing(path)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(path)
        .map_err(ReceiverError::io("create", path))?;
    io::copy(entry, &mut file).map_err(ReceiverError::io("write", path))?;
    // creation mode is filtered by the umask
    file.set_permissions(Permissions::from_mode(mode))
        .map_err(ReceiverError::io("set permissions on", path))
}

fn write_symlink(target: &Path, path: &Path) -> ReceiverResult<()> {
    ensure_parent(path)?;
    remove_existing(path)?;
    symlink(target, path).map_err(ReceiverError::io("create symlink", path))
}

fn write_hard_link(target: &Path, path: &Path) -> ReceiverResult<()> {
    ensure_parent(path)?;
    remove_existing(path)?;
    fs::hard_link(target, path).map_err(ReceiverError::io("create hard link", path))
}

fn remove_existing(path: &Path) -> ReceiverResult<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if !metadata.is_dir() => {
            fs::remove_file(path).map_err(ReceiverError::io("replace", path))
        }
        _ => Ok(()),
    }
}

fn missing_link_target(path: &Path) -> ReceiverError {
    ReceiverError::Io {
        operation: "resolve link target for",
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, "link entry without a target"),
    }
}

// Best effort: a failure here never fails the extraction
fn apply_times(path: &Path, header: &Header) {
    let Ok(modified) = header.mtime() else {
        return;
    };
    let accessed = header
        .as_gnu()
        .and_then(|gnu| gnu.atime().ok())
        .filter(|atime| *atime > 0)
        .unwrap_or(modified);

    let times = FileTimes::new()
        .set_accessed(UNIX_EPOCH + Duration::from_secs(accessed))
        .set_modified(UNIX_EPOCH + Duration::from_secs(modified));

    if let Err(e) = File::open(path).and_then(|file| file.set_times(times)) {
        log::trace!("Unable to set times on {}: {}", path.display(), e);
    }
}
