//! String table decoding

use crate::error::Result;
use crate::io::ByteView;
use std::borrow::Cow;

/// A byte range holding NUL-terminated strings addressed by byte offset.
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    view: ByteView<'a>,
}

impl<'a> StringTable<'a> {
    pub fn new(view: ByteView<'a>) -> Self {
        Self { view }
    }

    pub fn view(&self) -> ByteView<'a> {
        self.view
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// The string starting at `offset`.
    ///
    /// An unterminated final string runs to the end of the table.
    pub fn string(&self, offset: usize) -> Result<&'a str> {
        self.view.string(offset, usize::MAX)
    }

    /// Every string in the table, with its offset, in file order.
    ///
    /// Walks NUL-terminated runs from offset 0. Invalid UTF-8 is replaced
    /// rather than reported, since this is meant for display.
    pub fn strings(&self) -> Strings<'a> {
        Strings {
            bytes: self.view.bytes(),
            pos: 0,
        }
    }
}

/// Iterator returned by [`StringTable::strings`].
#[derive(Debug, Clone)]
pub struct Strings<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Strings<'a> {
    type Item = (usize, Cow<'a, str>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.bytes[start..];
        let len = memchr::memchr(0, rest).unwrap_or(rest.len());
        self.pos = start + len + 1;
        Some((start, String::from_utf8_lossy(&rest[..len])))
    }
}
