//! Error types for typelib loading and decoding.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading or decoding a typelib buffer.
///
/// All of these are recoverable, returned values; the only fatal condition in
/// the format layer is the compiled-layout mismatch detected by
/// [`layout_check`](crate::layout_check), which aborts instead of returning.
#[derive(Debug, Error)]
pub enum TypelibError {
    /// The buffer does not conform to the format.
    #[error("corrupt typelib: {reason}")]
    Corrupt { reason: String },

    /// A record or string offset points outside the buffer.
    #[error("offset {offset:#x} out of bounds reading {what} ({len}-byte buffer)")]
    OutOfBounds {
        what: &'static str,
        offset: u32,
        len: usize,
    },

    /// A stored tag value has no meaning in the format.
    #[error("invalid {what} tag {raw} at offset {offset:#x}")]
    InvalidTag {
        what: &'static str,
        raw: u32,
        offset: u32,
    },

    /// A 1-based directory index outside `1..=n_entries`.
    #[error("directory index {index} out of range 1..={max}")]
    IndexOutOfRange { index: u16, max: u16 },

    /// The typelib file could not be read.
    #[error("failed to read typelib from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TypelibError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        TypelibError::Corrupt {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TypelibError>;
