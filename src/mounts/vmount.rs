//! Decoder for the packed mount descriptors returned by `mntctl(MCTL_QUERY)`.
//!
//! See `<sys/vmount.h>`. Each `struct vmount` starts with a fixed header that
//! carries the record's total length and its filesystem type, followed by an
//! array of `(offset, size)` pairs locating the variable-length data fields
//! (device object, mount stub, host, ...) inside the same record. Records are
//! laid out back to back, so the buffer is walked with a byte cursor that
//! advances by each record's own length.

use super::error::DecodeError;

/// Size of the fixed `struct vmount` header including the data index.
pub const HEADER_LEN: usize = DATA_INDEX_OFFSET + DATA_FIELD_COUNT * DATA_ENTRY_LEN;

const LENGTH_OFFSET: usize = 4;
const GFSTYPE_OFFSET: usize = 32;
const DATA_INDEX_OFFSET: usize = 36;
const DATA_ENTRY_LEN: usize = 4;
const DATA_FIELD_COUNT: usize = 6;

/// `MNT_J2`: enhanced journaled filesystem.
pub const MNT_J2: i32 = 0;
/// `MNT_JFS`: journaled filesystem.
pub const MNT_JFS: i32 = 3;

/// Indices into the `vmt_data` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataField {
    Object = 0,
    Stub = 1,
    Host = 2,
    Hostname = 3,
    Info = 4,
    Args = 5,
}

/// A single mount descriptor borrowed from the query buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct Vmount<'a> {
    record: &'a [u8],
    offset: usize,
}

impl<'a> Vmount<'a> {
    /// Filesystem type code (`vmt_gfstype`).
    pub fn gfstype(&self) -> i32 {
        read_i32(self.record, GFSTYPE_OFFSET)
    }

    /// Returns the bytes of a data field up to (excluding) its NUL terminator.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::DataOutOfBounds`] if the index entry points outside the record.
    pub fn data(&self, field: DataField) -> Result<&'a [u8], DecodeError> {
        let index = field as usize;
        let entry = DATA_INDEX_OFFSET + index * DATA_ENTRY_LEN;
        let out_of_bounds = || DecodeError::DataOutOfBounds {
            offset: self.offset,
            index,
        };

        let off = usize::try_from(read_i16(self.record, entry)).map_err(|_| out_of_bounds())?;
        let size =
            usize::try_from(read_i16(self.record, entry + 2)).map_err(|_| out_of_bounds())?;
        let data = self
            .record
            .get(off..off + size)
            .ok_or_else(out_of_bounds)?;

        Ok(match data.iter().position(|&b| b == 0) {
            Some(nul) => &data[..nul],
            None => data,
        })
    }
}

/// Iterator over the first `count` records of a query buffer.
///
/// Yields an error and stops when a record header is truncated or declares a
/// length that cannot advance the cursor.
#[derive(Debug)]
pub struct Records<'a> {
    buf: &'a [u8],
    offset: usize,
    remaining: usize,
}

/// Walks `count` packed records starting at the beginning of `buf`.
pub fn records(buf: &[u8], count: usize) -> Records<'_> {
    Records {
        buf,
        offset: 0,
        remaining: count,
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Vmount<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let offset = self.offset;
        let rest = &self.buf[offset.min(self.buf.len())..];
        if rest.len() < HEADER_LEN {
            self.remaining = 0;
            return Some(Err(DecodeError::Truncated {
                offset,
                available: rest.len(),
                needed: HEADER_LEN,
            }));
        }

        let length = read_u32(rest, LENGTH_OFFSET) as usize;
        if length < HEADER_LEN {
            self.remaining = 0;
            return Some(Err(DecodeError::InvalidLength { offset, length }));
        }
        if length > rest.len() {
            self.remaining = 0;
            return Some(Err(DecodeError::Truncated {
                offset,
                available: rest.len(),
                needed: length,
            }));
        }

        self.offset += length;
        Some(Ok(Vmount {
            record: &rest[..length],
            offset,
        }))
    }
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at..at + 4]);
    u32::from_ne_bytes(raw)
}

fn read_i32(buf: &[u8], at: usize) -> i32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at..at + 4]);
    i32::from_ne_bytes(raw)
}

fn read_i16(buf: &[u8], at: usize) -> i16 {
    let mut raw = [0u8; 2];
    raw.copy_from_slice(&buf[at..at + 2]);
    i16::from_ne_bytes(raw)
}

/// Builds a packed record the way the kernel lays it out. Test-only.
#[cfg(test)]
pub(crate) fn encode(gfstype: i32, object: &str, stub: &str) -> Vec<u8> {
    let mut data = Vec::new();
    let mut index = [(0i16, 0i16); DATA_FIELD_COUNT];
    for (field, value) in [(DataField::Object, object), (DataField::Stub, stub)] {
        let off = HEADER_LEN + data.len();
        data.extend_from_slice(value.as_bytes());
        data.push(0);
        index[field as usize] = (off as i16, (value.len() + 1) as i16);
    }
    while data.len() % 4 != 0 {
        data.push(0);
    }

    let length = HEADER_LEN + data.len();
    let mut record = vec![0u8; HEADER_LEN];
    record[..4].copy_from_slice(&1u32.to_ne_bytes());
    record[LENGTH_OFFSET..LENGTH_OFFSET + 4].copy_from_slice(&(length as u32).to_ne_bytes());
    record[GFSTYPE_OFFSET..GFSTYPE_OFFSET + 4].copy_from_slice(&gfstype.to_ne_bytes());
    for (i, (off, size)) in index.iter().enumerate() {
        let at = DATA_INDEX_OFFSET + i * DATA_ENTRY_LEN;
        record[at..at + 2].copy_from_slice(&off.to_ne_bytes());
        record[at + 2..at + 4].copy_from_slice(&size.to_ne_bytes());
    }
    record.extend_from_slice(&data);
    record
}
