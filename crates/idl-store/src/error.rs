use std::io;

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying backend.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// CRC integrity check failed for a log frame.
    #[error("CRC integrity check failed at offset {offset}: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        offset: u64,
        expected: u32,
        actual: u32,
    },

    /// A log frame has an invalid length field.
    #[error("invalid log frame length {length} at offset {offset}")]
    InvalidFrameLength { offset: u64, length: u32 },

    /// The log file header does not carry the expected magic bytes.
    #[error("block log header has wrong magic bytes")]
    BadMagic,

    /// The log file was written by an unsupported format version.
    #[error("unsupported block log version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
