//! Bounds-checked windows into a [`ByteImage`].

use crate::error::{Error, Result};
use crate::io::{ByteImage, ByteOrder};

/// A window `[offset, offset + len)` into a [`ByteImage`].
///
/// Views are `Copy` and borrow the image, so they can never outlive it. All
/// offsets passed to a view's accessors are relative to the start of the
/// view, and every access is checked against the view's own length, never
/// the image's.
#[derive(Clone, Copy)]
pub struct ByteView<'a> {
    image: &'a ByteImage,
    offset: usize,
    len: usize,
}

impl<'a> ByteView<'a> {
    pub(crate) fn new(image: &'a ByteImage, offset: usize, len: usize) -> Self {
        Self { image, offset, len }
    }

    /// Absolute offset of this view within its image.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.image.byte_order()
    }

    /// The bytes covered by this view.
    pub fn bytes(&self) -> &'a [u8] {
        &self.image.as_bytes()[self.offset..self.offset + self.len]
    }

    /// A view over `[offset, offset + len)` relative to this view.
    ///
    /// Fails with [`Error::OutOfBounds`] when the range does not fit inside
    /// this view; a sub-view can never widen access beyond its parent.
    pub fn subview(&self, offset: u64, len: u64) -> Result<ByteView<'a>> {
        let out_of_bounds = || Error::OutOfBounds {
            offset,
            len,
            size: self.len as u64,
        };
        let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
        if end > self.len as u64 {
            return Err(out_of_bounds());
        }
        Ok(ByteView {
            image: self.image,
            offset: self.offset + offset as usize,
            len: len as usize,
        })
    }

    /// The `len` bytes at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        let end = offset.checked_add(len).filter(|&end| end <= self.len);
        match end {
            Some(end) => Ok(&self.bytes()[offset..end]),
            None => Err(Error::OutOfBounds {
                offset: offset as u64,
                len: len as u64,
                size: self.len as u64,
            }),
        }
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(offset, N)?);
        Ok(out)
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        Ok(self.array::<1>(offset)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16> {
        self.read_u16_as(offset, self.byte_order())
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32> {
        self.read_u32_as(offset, self.byte_order())
    }

    pub fn read_u64(&self, offset: usize) -> Result<u64> {
        self.read_u64_as(offset, self.byte_order())
    }

    // Explicit-order reads, used only while the header is being decoded and
    // the image's own order may not be fixed yet.
    pub(crate) fn read_u16_as(&self, offset: usize, order: ByteOrder) -> Result<u16> {
        let bytes = self.array(offset)?;
        Ok(match order {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        })
    }

    pub(crate) fn read_u32_as(&self, offset: usize, order: ByteOrder) -> Result<u32> {
        let bytes = self.array(offset)?;
        Ok(match order {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }

    pub(crate) fn read_u64_as(&self, offset: usize, order: ByteOrder) -> Result<u64> {
        let bytes = self.array(offset)?;
        Ok(match order {
            ByteOrder::Little => u64::from_le_bytes(bytes),
            ByteOrder::Big => u64::from_be_bytes(bytes),
        })
    }

    /// Reads a NUL-terminated string starting at `offset`.
    ///
    /// The scan stops at the first NUL, after `max_len` bytes, or at the end
    /// of the view, whichever comes first.
    pub fn string(&self, offset: usize, max_len: usize) -> Result<&'a str> {
        if offset >= self.len {
            return Err(Error::OutOfBounds {
                offset: offset as u64,
                len: 1,
                size: self.len as u64,
            });
        }
        let window = &self.bytes()[offset..];
        let window = &window[..window.len().min(max_len)];
        let end = memchr::memchr(0, window).unwrap_or(window.len());
        std::str::from_utf8(&window[..end]).map_err(|_| Error::InvalidString {
            offset: self.offset + offset,
        })
    }
}

impl std::fmt::Debug for ByteView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteView")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}
