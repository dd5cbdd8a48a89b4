use std::fmt;

use super::table::{MountTable, QueryOutcome};
use super::vmount::{self, DataField, MNT_J2, MNT_JFS};
use super::{Error, Result};
use crate::error::ResultOkLogExt;

/// Initial size of the mount-table query buffer.
pub const INITIAL_BUFFER_SIZE: usize = 4096;
/// Number of queries attempted before giving up on an undersized buffer.
pub const MAX_ATTEMPTS: usize = 3;

/// Journaled filesystem flavours retained by the enumerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsType {
    Jfs2,
    Jfs,
    Unknown,
}

impl FsType {
    /// Maps a `vmt_gfstype` code, returning `None` for non-journaled types.
    pub fn from_gfstype(code: i32) -> Option<Self> {
        match code {
            MNT_J2 => Some(FsType::Jfs2),
            MNT_JFS => Some(FsType::Jfs),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FsType::Jfs2 => "jfs2",
            FsType::Jfs => "jfs",
            FsType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mounted journaled filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub device: String,
    pub mount_path: String,
    pub fs_type: FsType,
}

/// Lists the currently mounted journaled filesystems.
///
/// Never fails: query errors and an exhausted buffer budget are logged and
/// yield an empty list.
pub fn list_mounts(table: &dyn MountTable) -> Vec<MountRecord> {
    try_list_mounts(table).ok_log().unwrap_or_default()
}

/// Queries the mount table, doubling the buffer on each undersized attempt.
///
/// # Errors
///
/// - [`Error::Query`] if the kernel query fails.
/// - [`Error::BufferExhausted`] if the table does not fit within [`MAX_ATTEMPTS`] queries.
pub fn try_list_mounts(table: &dyn MountTable) -> Result<Vec<MountRecord>> {
    let mut size = INITIAL_BUFFER_SIZE;

    for attempt in 1..=MAX_ATTEMPTS {
        let mut buf = vec![0u8; size];
        match table
            .query(&mut buf)
            .map_err(|source| Error::Query { size, source })?
        {
            QueryOutcome::Entries(count) => {
                log::trace!("mount table query returned {count} entries (attempt {attempt})");
                return Ok(decode_mounts(&buf, count));
            }
            QueryOutcome::TooSmall => {
                log::debug!("mount table does not fit into {size} bytes, retrying");
                size *= 2;
            }
        }
    }

    Err(Error::BufferExhausted {
        size: size / 2,
        attempts: MAX_ATTEMPTS,
    })
}

/// Extracts the journaled mounts from a filled query buffer.
fn decode_mounts(buf: &[u8], count: usize) -> Vec<MountRecord> {
    let mut out = Vec::with_capacity(count);

    for record in vmount::records(buf, count) {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                log::warn!("stopped walking mount table: {err}");
                break;
            }
        };

        let Some(fs_type) = FsType::from_gfstype(record.gfstype()) else {
            continue;
        };

        let fields = record
            .data(DataField::Object)
            .and_then(|object| Ok((object, record.data(DataField::Stub)?)));
        let (object, stub) = match fields {
            Ok(fields) => fields,
            Err(err) => {
                log::warn!("skipping mount descriptor: {err}");
                continue;
            }
        };
        if object.is_empty() || stub.is_empty() {
            continue;
        }

        out.push(MountRecord {
            device: String::from_utf8_lossy(object).into_owned(),
            mount_path: String::from_utf8_lossy(stub).into_owned(),
            fs_type,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mounts::vmount::encode;
    use std::sync::Mutex;

    const MNT_NFS: i32 = 2;
    const MNT_PROCFS: i32 = 6;

    /// Replays a fixed table, answering `TooSmall` for the first `too_small` queries.
    struct FakeTable {
        image: Vec<u8>,
        count: usize,
        too_small: usize,
        sizes: Mutex<Vec<usize>>,
    }

    impl FakeTable {
        fn new(records: &[(i32, &str, &str)], too_small: usize) -> Self {
            let image = records
                .iter()
                .flat_map(|(t, o, s)| encode(*t, o, s))
                .collect();
            Self {
                image,
                count: records.len(),
                too_small,
                sizes: Mutex::new(Vec::new()),
            }
        }

        fn sizes(&self) -> Vec<usize> {
            self.sizes.lock().unwrap().clone()
        }
    }

    impl MountTable for FakeTable {
        fn query(&self, buf: &mut [u8]) -> std::io::Result<QueryOutcome> {
            let mut sizes = self.sizes.lock().unwrap();
            sizes.push(buf.len());
            if sizes.len() <= self.too_small || buf.len() < self.image.len() {
                return Ok(QueryOutcome::TooSmall);
            }
            buf[..self.image.len()].copy_from_slice(&self.image);
            Ok(QueryOutcome::Entries(self.count))
        }
    }

    struct FailingTable;

    impl MountTable for FailingTable {
        fn query(&self, _buf: &mut [u8]) -> std::io::Result<QueryOutcome> {
            Err(std::io::Error::from_raw_os_error(libc::EINVAL))
        }
    }

    #[test]
    fn test_first_query_succeeds() {
        let table = FakeTable::new(&[(MNT_J2, "/dev/hd4", "/")], 0);
        let mounts = list_mounts(&table);
        assert_eq!(
            mounts,
            vec![MountRecord {
                device: "/dev/hd4".into(),
                mount_path: "/".into(),
                fs_type: FsType::Jfs2,
            }]
        );
        assert_eq!(table.sizes(), vec![4096]);
    }

    #[test]
    fn test_buffer_doubles_until_success() {
        for retries in 1..=2 {
            let table = FakeTable::new(&[(MNT_J2, "/dev/hd4", "/")], retries);
            let mounts = list_mounts(&table);
            assert_eq!(mounts.len(), 1);
            let expected: Vec<usize> = (0..=retries).map(|i| 4096 << i).collect();
            assert_eq!(table.sizes(), expected);
        }
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let table = FakeTable::new(&[(MNT_J2, "/dev/hd4", "/")], 3);
        assert!(list_mounts(&table).is_empty());
        assert_eq!(table.sizes(), vec![4096, 8192, 16384]);

        let table = FakeTable::new(&[(MNT_J2, "/dev/hd4", "/")], 3);
        match try_list_mounts(&table).unwrap_err() {
            Error::BufferExhausted { size, attempts } => {
                assert_eq!(size, 16384);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_query_error_yields_empty() {
        assert!(list_mounts(&FailingTable).is_empty());
        let err = try_list_mounts(&FailingTable).unwrap_err();
        assert!(matches!(err, Error::Query { size: 4096, .. }));
    }

    #[test]
    fn test_filters_non_journaled_types() {
        let table = FakeTable::new(
            &[
                (MNT_J2, "/dev/hd4", "/"),
                (MNT_PROCFS, "/proc", "/proc"),
                (MNT_JFS, "/dev/lv00", "/legacy"),
                (MNT_NFS, "server:/export", "/mnt/nfs"),
                (MNT_J2, "/dev/hd2", "/usr"),
            ],
            0,
        );
        let mounts = list_mounts(&table);
        let summary: Vec<_> = mounts
            .iter()
            .map(|m| (m.mount_path.as_str(), m.fs_type.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![("/", "jfs2"), ("/legacy", "jfs"), ("/usr", "jfs2")]
        );
    }

    #[test]
    fn test_skips_records_without_device_or_mount_path() {
        let table = FakeTable::new(
            &[
                (MNT_J2, "", "/nodevice"),
                (MNT_J2, "/dev/hd9var", ""),
                (MNT_J2, "/dev/hd9var", "/var"),
            ],
            0,
        );
        let mounts = list_mounts(&table);
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].mount_path, "/var");
    }

    #[test]
    fn test_truncated_table_keeps_decoded_prefix() {
        let mut table = FakeTable::new(
            &[(MNT_J2, "/dev/hd4", "/"), (MNT_J2, "/dev/hd2", "/usr")],
            0,
        );
        table.count = 3;
        let mounts = list_mounts(&table);
        assert_eq!(mounts.len(), 2);
    }

    #[test]
    fn test_fs_type_display() {
        assert_eq!(FsType::Jfs2.to_string(), "jfs2");
        assert_eq!(FsType::Jfs.to_string(), "jfs");
        assert_eq!(FsType::Unknown.to_string(), "unknown");
        assert_eq!(FsType::from_gfstype(MNT_NFS), None);
    }
}
