//! Error types for the elfview decoder.
//!
//! Every failure the decoder can report is a variant of [`Error`]. Variants
//! fall into four groups (see [`ErrorKind`]) so that a caller can decide
//! whether to abort opening a file or just skip one table or record.

use crate::io::error::IoError;
use thiserror::Error;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The file could not be opened, sized or read.
    Io,
    /// The bytes are not a (supported) ELF image.
    Format,
    /// A byte range or table index falls outside its parent.
    Bounds,
    /// A variable-length record declares sizes that do not fit.
    MalformedRecord,
}

/// Main error type for decoding operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Loading the image failed
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    #[error("Invalid ELF magic")]
    InvalidMagic,

    #[error("Image too small: need {needed} bytes, found {found}")]
    TooSmall { needed: usize, found: usize },

    #[error("Unsupported ELF class: {0}")]
    UnsupportedClass(u8),

    #[error("Unsupported ELF data encoding: {0}")]
    UnsupportedData(u8),

    /// The header declares a table entry size too small for the record layout
    #[error("Invalid {table} entry size: expected at least {expected}, got {found}")]
    InvalidEntrySize {
        table: &'static str,
        expected: usize,
        found: usize,
    },

    /// The byte order of an image may only be fixed once
    #[error("Byte order already set for this image")]
    ByteOrderLocked,

    #[error("Section {index} is not a string table")]
    NotAStringTable { index: usize },

    #[error("String at offset {offset:#x} is not UTF-8")]
    InvalidString { offset: usize },

    /// A requested byte range exceeds its parent
    #[error("Range {offset:#x}+{len:#x} exceeds size {size:#x}")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    /// A requested table index exceeds its table
    #[error("{what} index {index} out of range (count {count})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
    },

    /// A note record does not fit in its enclosing region
    #[error("Malformed note at offset {offset:#x}: {message}")]
    MalformedNote { offset: usize, message: String },
}

impl Error {
    /// The taxonomy group this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidMagic
            | Error::TooSmall { .. }
            | Error::UnsupportedClass(_)
            | Error::UnsupportedData(_)
            | Error::InvalidEntrySize { .. }
            | Error::ByteOrderLocked
            | Error::NotAStringTable { .. }
            | Error::InvalidString { .. } => ErrorKind::Format,
            Error::OutOfBounds { .. } | Error::IndexOutOfRange { .. } => ErrorKind::Bounds,
            Error::MalformedNote { .. } => ErrorKind::MalformedRecord,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(IoError::from(err))
    }
}

/// Result type alias for decoding operations
pub type Result<T> = std::result::Result<T, Error>;
