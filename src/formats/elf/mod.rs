//! ELF (Executable and Linkable Format) decoder
//!
//! A zero-copy ELF decoder covering both classes and both byte orders.
//! [`ObjectFile`] ties the pieces together; the table types can also be
//! used on their own.

pub mod headers;
pub mod notes;
pub mod sections;
pub mod segments;
pub mod strtab;
pub mod symbols;
pub mod types;
pub mod utils;

use crate::error::{Error, Result};
use crate::io::ByteImage;
use crate::{log_error, span_trace};
pub use headers::{ElfIdent, FileHeader};
pub use notes::{Note, NoteTable};
pub use sections::{Section, SectionData, SectionTable};
pub use segments::{Segment, SegmentData, SegmentTable};
pub use strtab::StringTable;
pub use symbols::{Symbol, SymbolTable};
use tracing::debug;
pub use types::*;

/// A decoded ELF object borrowing its image.
#[derive(Debug, Clone)]
pub struct ObjectFile<'a> {
    image: &'a ByteImage,
    header: FileHeader,
    sections: SectionTable<'a>,
    segments: SegmentTable<'a>,
}

impl<'a> ObjectFile<'a> {
    /// Decode the object held by `image`.
    ///
    /// Reads the header, fixes the image's byte order to the one the header
    /// names, then decodes the section and program header tables. An image
    /// whose order was already fixed must agree with the header.
    pub fn parse(image: &'a mut ByteImage) -> Result<Self> {
        let span = span_trace!("parse_elf", size = image.len());
        let _guard = span.enter();

        let header = FileHeader::parse(&image.full_view())?;
        let order = header.byte_order();
        if !image.is_byte_order_locked() {
            image.set_byte_order(order)?;
        } else if image.byte_order() != order {
            return Err(Error::ByteOrderLocked);
        }

        // No further mutation; every view sees the final byte order
        let image: &'a ByteImage = image;

        let sections = SectionTable::parse(image, &header)
            .map_err(|e| log_error!(e, "section header table"))?;
        let segments = SegmentTable::parse(image, &header)
            .map_err(|e| log_error!(e, "program header table"))?;

        debug!(
            class = header.class_string(),
            data = header.data_string(),
            machine = %header.machine_string(),
            sections = sections.len(),
            segments = segments.len(),
            "Decoded ELF object"
        );

        Ok(Self {
            image,
            header,
            sections,
            segments,
        })
    }

    /// Get ELF header
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn image(&self) -> &'a ByteImage {
        self.image
    }

    pub fn sections(&self) -> &SectionTable<'a> {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Result<&Section<'a>> {
        self.sections.section(index)
    }

    pub fn segments(&self) -> &SegmentTable<'a> {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Result<&Segment<'a>> {
        self.segments.segment(index)
    }

    pub fn section_name(&self, section: &Section<'_>) -> Result<&'a str> {
        self.sections.section_name(section)
    }

    /// Resolve `offset` in the string table held by section `index`.
    pub fn string(&self, index: usize, offset: usize) -> Result<&'a str> {
        self.sections.string(index, offset)
    }

    pub fn symbol_name(&self, symbol: &Symbol) -> Result<&'a str> {
        symbol.name(&self.sections)
    }

    /// Every `SHT_SYMTAB` and `SHT_DYNSYM` section with its symbols.
    pub fn symbol_tables(&self) -> impl Iterator<Item = (&Section<'a>, &SymbolTable<'a>)> + '_ {
        self.sections.symbol_tables()
    }

    /// Get interpreter path
    pub fn interpreter(&self) -> Option<&'a str> {
        self.segments.interpreter()
    }

    /// The GNU build ID, from note sections or else note segments.
    pub fn build_id(&self) -> Option<&'a [u8]> {
        self.sections
            .iter()
            .filter_map(|s| s.as_notes())
            .chain(self.segments.iter().filter_map(|s| s.as_notes()))
            .find_map(|notes| notes.build_id())
    }
}
