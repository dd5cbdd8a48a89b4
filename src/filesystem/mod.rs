//! Capacity and inode statistics of mounted journaled filesystems.
mod statter;

pub use statter::{FilesystemStats, FsUsage, StatvfsStatter, Statter, stat_filesystems};

use crate::collector::Collect;
use crate::exposition::{MetricType, MetricWriter};
use crate::mounts::{self, MountTable};

type Family = (&'static str, &'static str, fn(&FilesystemStats) -> u64);

const FAMILIES: [Family; 6] = [
    ("aix_fs_size_bytes", "Filesystem size in bytes", |s| s.size_bytes),
    ("aix_fs_free_bytes", "Filesystem free space in bytes", |s| s.free_bytes),
    (
        "aix_fs_avail_bytes",
        "Filesystem space available to non-root users in bytes",
        |s| s.avail_bytes,
    ),
    ("aix_fs_files", "Filesystem total file nodes", |s| s.files),
    ("aix_fs_files_free", "Filesystem free file nodes", |s| s.files_free),
    (
        "aix_fs_files_avail",
        "Filesystem file nodes available to non-root users",
        |s| s.files_avail,
    ),
];

/// Enumerates the mounts and reports their capacity on every scrape.
pub struct FilesystemsCollector {
    table: Box<dyn MountTable>,
    statter: Box<dyn Statter>,
}

impl FilesystemsCollector {
    pub fn new(table: impl MountTable + 'static, statter: impl Statter + 'static) -> Self {
        Self {
            table: Box::new(table),
            statter: Box::new(statter),
        }
    }
}

impl Collect for FilesystemsCollector {
    fn collect(&self, out: &mut MetricWriter<'_>) {
        let mounts = mounts::list_mounts(self.table.as_ref());
        let filesystems = stat_filesystems(self.statter.as_ref(), mounts);
        write_filesystems(out, &filesystems);
    }
}

/// Writes the six capacity families, each with its header even when empty.
pub fn write_filesystems(out: &mut MetricWriter<'_>, filesystems: &[FilesystemStats]) {
    for (name, help, value) in FAMILIES {
        out.header(name, help, MetricType::Gauge);
        for fs in filesystems {
            out.sample(
                name,
                &[
                    ("device", fs.device.as_str()),
                    ("mountpoint", fs.mount_path.as_str()),
                    ("fstype", fs.fs_type.as_str()),
                ],
                value(fs),
            );
        }
    }
}
