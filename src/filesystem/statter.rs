use std::path::Path;

use crate::error::ResultOkLogExt;
use crate::mounts::{FsType, MountRecord};

/// Raw capacity and inode counters of a mounted filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FsUsage {
    pub blocks: u64,
    pub block_size: u64,
    pub free_blocks: u64,
    pub avail_blocks: u64,
    pub files: u64,
    pub files_free: u64,
    pub files_avail: u64,
}

/// Capacity query against a mount path.
pub trait Statter: Send + Sync {
    /// # Errors
    ///
    /// Returns the underlying OS error if the filesystem cannot be queried.
    fn stat(&self, path: &Path) -> nix::Result<FsUsage>;
}

/// `statvfs(2)` backed statter. All counters are widened to 64 bits.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatvfsStatter;

impl Statter for StatvfsStatter {
    fn stat(&self, path: &Path) -> nix::Result<FsUsage> {
        let stat = nix::sys::statvfs::statvfs(path)?;
        Ok(FsUsage {
            blocks: stat.blocks() as u64,
            block_size: stat.block_size() as u64,
            free_blocks: stat.blocks_free() as u64,
            avail_blocks: stat.blocks_available() as u64,
            files: stat.files() as u64,
            files_free: stat.files_free() as u64,
            files_avail: stat.files_available() as u64,
        })
    }
}

/// Capacity statistics of one mounted filesystem, in bytes and inodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemStats {
    pub mount_path: String,
    pub device: String,
    pub fs_type: FsType,
    pub size_bytes: u64,
    pub free_bytes: u64,
    pub avail_bytes: u64,
    pub files: u64,
    pub files_free: u64,
    pub files_avail: u64,
}

impl FilesystemStats {
    pub fn new(mount: MountRecord, usage: FsUsage) -> Self {
        Self {
            mount_path: mount.mount_path,
            device: mount.device,
            fs_type: mount.fs_type,
            size_bytes: usage.blocks.saturating_mul(usage.block_size),
            free_bytes: usage.free_blocks.saturating_mul(usage.block_size),
            avail_bytes: usage.avail_blocks.saturating_mul(usage.block_size),
            files: usage.files,
            files_free: usage.files_free,
            files_avail: usage.files_avail,
        }
    }
}

/// Stats every mount, dropping (and logging) those whose query fails.
pub fn stat_filesystems(statter: &dyn Statter, mounts: Vec<MountRecord>) -> Vec<FilesystemStats> {
    mounts
        .into_iter()
        .filter_map(|mount| {
            let usage = statter
                .stat(Path::new(&mount.mount_path))
                .ok_log_context(&format!("statvfs failed for `{}`", mount.mount_path))?;
            Some(FilesystemStats::new(mount, usage))
        })
        .collect()
}
