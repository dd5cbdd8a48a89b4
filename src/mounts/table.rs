/// Outcome of a single mount-table query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The buffer now holds this many packed `vmount` records.
    Entries(usize),
    /// The buffer was too small to hold the table.
    TooSmall,
}

/// Source of the kernel's live mount table.
pub trait MountTable: Send + Sync {
    /// Fills `buf` with packed mount descriptors.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the kernel rejects the query.
    fn query(&self, buf: &mut [u8]) -> std::io::Result<QueryOutcome>;
}

/// The running kernel's mount table, read through `mntctl(MCTL_QUERY)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelMountTable;

#[cfg(target_os = "aix")]
mod ffi {
    use libc::{c_char, c_int};

    pub const MCTL_QUERY: c_int = 2;

    unsafe extern "C" {
        pub fn mntctl(command: c_int, size: c_int, buffer: *mut c_char) -> c_int;
    }
}

#[cfg(target_os = "aix")]
impl MountTable for KernelMountTable {
    fn query(&self, buf: &mut [u8]) -> std::io::Result<QueryOutcome> {
        let size = libc::c_int::try_from(buf.len()).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "mount table buffer exceeds c_int range",
            )
        })?;
        buf.fill(0);
        // SAFETY: `buf` is a live, exclusively borrowed allocation of exactly `size` bytes.
        let rc = unsafe { ffi::mntctl(ffi::MCTL_QUERY, size, buf.as_mut_ptr().cast()) };
        match rc {
            n if n > 0 => Ok(QueryOutcome::Entries(n as usize)),
            0 => Ok(QueryOutcome::TooSmall),
            _ => Err(std::io::Error::last_os_error()),
        }
    }
}

#[cfg(not(target_os = "aix"))]
impl MountTable for KernelMountTable {
    fn query(&self, _buf: &mut [u8]) -> std::io::Result<QueryOutcome> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "mntctl is only available on AIX",
        ))
    }
}
