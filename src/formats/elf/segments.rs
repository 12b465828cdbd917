//! Program header (segment) parsing

use crate::error::{Error, Result};
use crate::formats::elf::headers::FileHeader;
use crate::formats::elf::notes::NoteTable;
use crate::formats::elf::sections::initial_section_header;
use crate::formats::elf::types::*;
use crate::formats::elf::utils::{name_or_unknown, read_word};
use crate::io::{ByteImage, ByteView};
use std::borrow::Cow;
use tracing::{debug, trace, warn};

const TYPE_NAMES: &[(u32, &str)] = &[
    (PT_NULL, "PT_NULL"),
    (PT_LOAD, "PT_LOAD"),
    (PT_DYNAMIC, "PT_DYNAMIC"),
    (PT_INTERP, "PT_INTERP"),
    (PT_NOTE, "PT_NOTE"),
    (PT_SHLIB, "PT_SHLIB"),
    (PT_PHDR, "PT_PHDR"),
    (PT_TLS, "PT_TLS"),
    (PT_GNU_EH_FRAME, "PT_GNU_EH_FRAME"),
    (PT_GNU_STACK, "PT_GNU_STACK"),
    (PT_GNU_RELRO, "PT_GNU_RELRO"),
    (PT_GNU_PROPERTY, "PT_GNU_PROPERTY"),
    (PT_SUNWBSS, "PT_SUNWBSS"),
    (PT_SUNWSTACK, "PT_SUNWSTACK"),
];

/// Type-specific contents of a segment.
#[derive(Debug, Clone)]
pub enum SegmentData<'a> {
    Generic(ByteView<'a>),
    /// Path of the program interpreter
    Interpreter(&'a str),
    Notes(NoteTable<'a>),
}

/// One entry of the program header table.
#[derive(Debug, Clone)]
pub struct Segment<'a> {
    index: usize,
    pub header: ProgramHeader,
    data: Result<SegmentData<'a>>,
}

impl<'a> Segment<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn p_type(&self) -> u32 {
        self.header.p_type
    }

    pub fn flags(&self) -> SegmentFlags {
        SegmentFlags::from_bits_retain(self.header.p_flags)
    }

    pub fn offset(&self) -> u64 {
        self.header.p_offset
    }

    pub fn vaddr(&self) -> u64 {
        self.header.p_vaddr
    }

    pub fn paddr(&self) -> u64 {
        self.header.p_paddr
    }

    pub fn filesz(&self) -> u64 {
        self.header.p_filesz
    }

    pub fn memsz(&self) -> u64 {
        self.header.p_memsz
    }

    pub fn align(&self) -> u64 {
        self.header.p_align
    }

    pub fn is_load(&self) -> bool {
        self.header.p_type == PT_LOAD
    }

    pub fn is_executable(&self) -> bool {
        self.flags().contains(SegmentFlags::X)
    }

    pub fn is_writable(&self) -> bool {
        self.flags().contains(SegmentFlags::W)
    }

    pub fn is_readable(&self) -> bool {
        self.flags().contains(SegmentFlags::R)
    }

    /// Check if virtual address is in segment
    pub fn contains_addr(&self, addr: u64) -> bool {
        addr >= self.header.p_vaddr && addr - self.header.p_vaddr < self.header.p_memsz
    }

    pub fn type_string(&self) -> Cow<'static, str> {
        name_or_unknown(TYPE_NAMES, self.header.p_type)
    }

    /// Hex flags followed by the set permission bits, e.g. `0x00000005 (PF_X, PF_R)`.
    pub fn flags_string(&self) -> String {
        let names: Vec<String> = self
            .flags()
            .iter_names()
            .map(|(name, _)| format!("PF_{name}"))
            .collect();
        let mut out = format!("{:#010x}", self.header.p_flags);
        if !names.is_empty() {
            out.push_str(&format!(" ({})", names.join(", ")));
        }
        out
    }

    /// The decoded contents, or the error that stopped them decoding.
    pub fn data(&self) -> Result<&SegmentData<'a>> {
        self.data.as_ref().map_err(Clone::clone)
    }

    /// The interpreter path of a `PT_INTERP` segment.
    pub fn interpreter(&self) -> Option<&'a str> {
        match self.data {
            Ok(SegmentData::Interpreter(path)) => Some(path),
            _ => None,
        }
    }

    pub fn as_notes(&self) -> Option<&NoteTable<'a>> {
        match &self.data {
            Ok(SegmentData::Notes(table)) => Some(table),
            _ => None,
        }
    }
}

/// The decoded program header table, in file order.
#[derive(Debug, Clone)]
pub struct SegmentTable<'a> {
    segments: Vec<Segment<'a>>,
}

impl<'a> SegmentTable<'a> {
    /// Decode the program header table described by `header`.
    ///
    /// Follows the same failure rules as the section table: bad geometry
    /// fails the table, bad contents stay with their segment.
    pub fn parse(image: &'a ByteImage, header: &FileHeader) -> Result<Self> {
        let class = header.class();
        if header.e_phoff == 0 || header.e_phnum == 0 {
            return Ok(Self {
                segments: Vec::new(),
            });
        }

        let expected = class.program_header_size();
        if (header.e_phentsize as usize) < expected {
            return Err(Error::InvalidEntrySize {
                table: "program header",
                expected,
                found: header.e_phentsize as usize,
            });
        }

        // With PN_XNUM the real count is in section 0's sh_info
        let count = if header.e_phnum == PN_XNUM {
            match initial_section_header(image, header)? {
                Some(first) => first.sh_info as u64,
                None => PN_XNUM as u64,
            }
        } else {
            header.e_phnum as u64
        };

        let entsize = header.e_phentsize as u64;
        let table = image.view(header.e_phoff, count * entsize)?;

        let mut segments = Vec::with_capacity(count as usize);
        for index in 0..count as usize {
            let record = table.subview(index as u64 * entsize, expected as u64)?;
            let ph = parse_program_header(&record, class)?;
            let data = decode_data(image, &ph);
            if let Err(err) = &data {
                warn!(index, p_type = ph.p_type, error = %err, "Failed to decode segment contents");
            }
            trace!(index, p_type = ph.p_type, offset = ph.p_offset, filesz = ph.p_filesz, "Decoded segment");
            segments.push(Segment {
                index,
                header: ph,
                data,
            });
        }

        debug!(offset = header.e_phoff, count = segments.len(), "Decoded segment table");
        Ok(Self { segments })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment<'a>> {
        self.segments.iter()
    }

    /// Get segment by index
    pub fn segment(&self, index: usize) -> Result<&Segment<'a>> {
        self.segments.get(index).ok_or(Error::IndexOutOfRange {
            what: "segment",
            index,
            count: self.segments.len(),
        })
    }

    /// Get interpreter path
    pub fn interpreter(&self) -> Option<&'a str> {
        self.segments.iter().find_map(|s| s.interpreter())
    }

    /// Find segment containing virtual address
    pub fn by_addr(&self, addr: u64) -> Option<&Segment<'a>> {
        self.segments
            .iter()
            .find(|s| s.is_load() && s.contains_addr(addr))
    }
}

impl<'t, 'a> IntoIterator for &'t SegmentTable<'a> {
    type Item = &'t Segment<'a>;
    type IntoIter = std::slice::Iter<'t, Segment<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Parse a single program header
pub fn parse_program_header(view: &ByteView<'_>, class: ElfClass) -> Result<ProgramHeader> {
    match class {
        ElfClass::Elf32 => Ok(ProgramHeader {
            p_type: view.read_u32(0)?,
            p_offset: read_word(view, 4, class)?,
            p_vaddr: read_word(view, 8, class)?,
            p_paddr: read_word(view, 12, class)?,
            p_filesz: read_word(view, 16, class)?,
            p_memsz: read_word(view, 20, class)?,
            p_flags: view.read_u32(24)?,
            p_align: read_word(view, 28, class)?,
        }),
        ElfClass::Elf64 => Ok(ProgramHeader {
            p_type: view.read_u32(0)?,
            p_flags: view.read_u32(4)?,
            p_offset: read_word(view, 8, class)?,
            p_vaddr: read_word(view, 16, class)?,
            p_paddr: read_word(view, 24, class)?,
            p_filesz: read_word(view, 32, class)?,
            p_memsz: read_word(view, 40, class)?,
            p_align: read_word(view, 48, class)?,
        }),
    }
}

fn decode_data<'a>(image: &'a ByteImage, ph: &ProgramHeader) -> Result<SegmentData<'a>> {
    let view = image.view(ph.p_offset, ph.p_filesz)?;
    Ok(match ph.p_type {
        PT_INTERP => SegmentData::Interpreter(view.string(0, view.len())?),
        PT_NOTE => SegmentData::Notes(NoteTable::parse(view)?),
        _ => SegmentData::Generic(view),
    })
}
