#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to query mount table with a {size} byte buffer: {source}")]
    Query {
        size: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("mount table did not fit into {size} bytes after {attempts} attempts")]
    BufferExhausted { size: usize, attempts: usize },
}

/// Errors raised while walking a packed `vmount` buffer.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("record at offset {offset} is truncated: {available} bytes left, need {needed}")]
    Truncated {
        offset: usize,
        available: usize,
        needed: usize,
    },
    #[error("record at offset {offset} declares invalid length {length}")]
    InvalidLength { offset: usize, length: usize },
    #[error("data field {index} of record at offset {offset} lies outside the record")]
    DataOutOfBounds { offset: usize, index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
