//! Owned byte images and bounds-checked views into them.
//!
//! A [`ByteImage`] holds the complete bytes of one object file, either read
//! into memory or memory-mapped read-only, together with the byte order used
//! to interpret multi-byte integers. All decoders reach the bytes through a
//! [`ByteView`], which re-checks every access against its own extent.

pub mod error;
mod view;

pub use view::ByteView;

use crate::error::{Error, Result};
use crate::io::error::IoError;
use bytes::Bytes;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Default upper bound on the size of a file accepted by [`ByteImage::load`] (1GB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Byte order used to interpret multi-byte integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    Little,
    Big,
}

/// How [`ByteImage::load_with`] brings the file into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadStrategy {
    /// Read the whole file into an owned buffer.
    #[default]
    Read,
    /// Memory-map the file read-only.
    Map,
}

/// Options controlling how an image is loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// The absolute maximum file size that can be opened.
    pub max_file_size: u64,
    /// Whether to read or map the file.
    pub strategy: LoadStrategy,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            strategy: LoadStrategy::Read,
        }
    }
}

enum Backing {
    Owned(Bytes),
    Mapped(Mmap),
}

impl Backing {
    fn as_slice(&self) -> &[u8] {
        match self {
            Backing::Owned(bytes) => bytes.as_ref(),
            Backing::Mapped(map) => &map[..],
        }
    }
}

/// The raw bytes of one object file plus the byte order used to read them.
///
/// The byte order starts out little-endian and may be fixed exactly once
/// with [`ByteImage::set_byte_order`]. Since that call takes `&mut self`, no
/// [`ByteView`] can exist while it runs, so every read observes the final
/// order.
pub struct ByteImage {
    backing: Backing,
    order: ByteOrder,
    order_locked: bool,
}

impl ByteImage {
    /// Reads the entire file at `path` into memory with default options.
    pub fn load<P: AsRef<Path>>(path: P) -> error::Result<Self> {
        Self::load_with(path, &LoadOptions::default())
    }

    /// Loads the file at `path` honouring `options`.
    ///
    /// Fails if the file cannot be opened or sized, exceeds
    /// `options.max_file_size`, or yields fewer bytes than its reported size.
    pub fn load_with<P: AsRef<Path>>(path: P, options: &LoadOptions) -> error::Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        debug!(
            path = %path.display(),
            size = file_size,
            strategy = ?options.strategy,
            "Loading image"
        );

        if file_size > options.max_file_size {
            warn!(
                path = %path.display(),
                size = file_size,
                limit = options.max_file_size,
                "File is too large"
            );
            return Err(IoError::FileTooLarge {
                limit: options.max_file_size,
                found: file_size,
            });
        }

        let backing = match options.strategy {
            // memmap cannot map empty files
            LoadStrategy::Map if file_size > 0 => {
                // Safety: the map is read-only and never outlives the file handle's target.
                Backing::Mapped(unsafe { Mmap::map(&file)? })
            }
            _ => {
                let mut buf = Vec::with_capacity(file_size as usize);
                file.read_to_end(&mut buf)?;
                if (buf.len() as u64) < file_size {
                    return Err(IoError::from(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!(
                            "read {} of {} bytes from '{}'",
                            buf.len(),
                            file_size,
                            path.display()
                        ),
                    )));
                }
                Backing::Owned(Bytes::from(buf))
            }
        };

        Ok(Self {
            backing,
            order: ByteOrder::Little,
            order_locked: false,
        })
    }

    /// Wraps an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            backing: Backing::Owned(bytes.into()),
            order: ByteOrder::Little,
            order_locked: false,
        }
    }

    /// Fixes the byte order used by every subsequent multi-byte read.
    ///
    /// May be called once per image; later calls fail with
    /// [`Error::ByteOrderLocked`].
    pub fn set_byte_order(&mut self, order: ByteOrder) -> Result<()> {
        if self.order_locked {
            return Err(Error::ByteOrderLocked);
        }
        self.order = order;
        self.order_locked = true;
        Ok(())
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Whether [`ByteImage::set_byte_order`] has already been called.
    pub fn is_byte_order_locked(&self) -> bool {
        self.order_locked
    }

    pub fn len(&self) -> usize {
        self.backing.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.backing.as_slice()
    }

    /// A view over the whole image.
    pub fn full_view(&self) -> ByteView<'_> {
        ByteView::new(self, 0, self.len())
    }

    /// A view over `[offset, offset + len)`.
    ///
    /// Fails with [`Error::OutOfBounds`] if the range exceeds the image.
    pub fn view(&self, offset: u64, len: u64) -> Result<ByteView<'_>> {
        self.full_view().subview(offset, len)
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        self.full_view().read_u8(offset)
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        self.full_view().read_u16(offset)
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        self.full_view().read_u32(offset)
    }

    pub fn read_u64(&self, offset: usize) -> Result<u64> {
        self.full_view().read_u64(offset)
    }

    /// Reads a NUL-terminated string of at most `max_len` bytes.
    pub fn string(&self, offset: usize, max_len: usize) -> Result<&str> {
        self.full_view().string(offset, max_len)
    }
}

impl std::fmt::Debug for ByteImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteImage")
            .field("len", &self.len())
            .field("order", &self.order)
            .field("order_locked", &self.order_locked)
            .finish()
    }
}
