//! Test modules for receivers
//!
//! Archive extraction is tested directly with in-memory tar archives; the
//! image receiver runs against a scripted container engine.

mod docker;

use tar::{Builder, EntryType, Header};

/// In-memory tar archive in the shape a root filesystem export has
pub(super) struct ArchiveBuilder {
    builder: Builder<Vec<u8>>,
}

impl ArchiveBuilder {
    pub(super) fn new() -> Self {
        Self {
            builder: Builder::new(Vec::new()),
        }
    }

    fn header(entry_type: EntryType, mode: u32, size: u64) -> Header {
        let mut header = Header::new_gnu();
        header.set_entry_type(entry_type);
        header.set_mode(mode);
        header.set_size(size);
        header.set_mtime(1_700_000_000);
        header
    }

    pub(super) fn dir(mut self, path: &str, mode: u32) -> Self {
        let mut header = Self::header(EntryType::Directory, mode, 0);
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .expect("append directory");
        self
    }

    pub(super) fn file(mut self, path: &str, mode: u32, contents: &[u8]) -> Self {
        let mut header = Self::header(EntryType::Regular, mode, contents.len() as u64);
        self.builder
            .append_data(&mut header, path, contents)
            .expect("append file");
        self
    }

    pub(super) fn symlink(mut self, path: &str, target: &str) -> Self {
        let mut header = Self::header(EntryType::Symlink, 0o777, 0);
        header.set_link_name(target).expect("link name");
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .expect("append symlink");
        self
    }

    pub(super) fn hard_link(mut self, path: &str, target: &str) -> Self {
        let mut header = Self::header(EntryType::Link, 0o644, 0);
        header.set_link_name(target).expect("link name");
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .expect("append hard link");
        self
    }

    pub(super) fn fifo(mut self, path: &str) -> Self {
        let mut header = Self::header(EntryType::Fifo, 0o644, 0);
        self.builder
            .append_data(&mut header, path, std::io::empty())
            .expect("append fifo");
        self
    }

    pub(super) fn finish(self) -> Vec<u8> {
        self.builder.into_inner().expect("finish archive")
    }
}

/// A small image root covering every entry kind the extractor handles
pub(super) fn sample_rootfs() -> Vec<u8> {
    ArchiveBuilder::new()
        .dir("rootfs/", 0o755)
        .dir("rootfs/bin/", 0o755)
        .file("rootfs/bin/busybox", 0o755, b"\x7fELF")
        .hard_link("rootfs/bin/sh", "rootfs/bin/busybox")
        .symlink("rootfs/bin/ls", "busybox")
        .dir("rootfs/etc/", 0o755)
        .file("rootfs/etc/shadow", 0o000, b"root:*:19000::::::\n")
        .symlink("rootfs/etc/mtab", "/proc/mounts")
        .fifo("rootfs/run.fifo")
        .finish()
}
