//! Shared test utilities for temporary files and image setup.

use elfview::{ByteImage, ObjectFile};
use std::io::Write;
use tempfile::NamedTempFile;

/// Creates a temporary file with the given content.
///
/// The file is removed when the returned `NamedTempFile` is dropped.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file
}

/// Wraps `data` in an image, parses it, and hands the object to `f`.
pub fn with_object<R>(data: Vec<u8>, f: impl FnOnce(&ObjectFile<'_>) -> R) -> R {
    let mut image = ByteImage::from_bytes(data);
    let elf = ObjectFile::parse(&mut image).unwrap();
    f(&elf)
}
