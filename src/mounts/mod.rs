//! Enumeration of mounted journaled filesystems from the kernel mount table.
mod enumerate;
mod error;
mod table;
pub mod vmount;

pub use enumerate::{
    FsType, INITIAL_BUFFER_SIZE, MAX_ATTEMPTS, MountRecord, list_mounts, try_list_mounts,
};
pub use error::{DecodeError, Error, Result};
pub use table::{KernelMountTable, MountTable, QueryOutcome};
