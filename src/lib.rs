//! elfview: a bounds-checked, zero-copy ELF decoder.
//!
//! Load an image with [`ByteImage::load`] (or wrap a buffer with
//! [`ByteImage::from_bytes`]) and decode it with [`ObjectFile::parse`].

/// Symbol name demangling
pub mod demangle;
/// Error types
pub mod error;
/// Object file formats
pub mod formats;
/// Byte images and views
pub mod io;
/// Tracing setup
pub mod logging;

pub use error::{Error, ErrorKind, Result};
pub use formats::elf::{FileHeader, ObjectFile};
pub use io::{ByteImage, ByteOrder, ByteView, LoadOptions, LoadStrategy};
