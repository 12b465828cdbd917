//! Section table decoding

use crate::error::{Error, Result};
use crate::formats::elf::headers::FileHeader;
use crate::formats::elf::notes::NoteTable;
use crate::formats::elf::strtab::StringTable;
use crate::formats::elf::symbols::SymbolTable;
use crate::formats::elf::types::*;
use crate::formats::elf::utils::{name_or_unknown, read_word};
use crate::io::{ByteImage, ByteView};
use std::borrow::Cow;
use tracing::{debug, trace, warn};

const TYPE_NAMES: &[(u32, &str)] = &[
    (SHT_NULL, "SHT_NULL"),
    (SHT_PROGBITS, "SHT_PROGBITS"),
    (SHT_SYMTAB, "SHT_SYMTAB"),
    (SHT_STRTAB, "SHT_STRTAB"),
    (SHT_RELA, "SHT_RELA"),
    (SHT_HASH, "SHT_HASH"),
    (SHT_DYNAMIC, "SHT_DYNAMIC"),
    (SHT_NOTE, "SHT_NOTE"),
    (SHT_NOBITS, "SHT_NOBITS"),
    (SHT_REL, "SHT_REL"),
    (SHT_SHLIB, "SHT_SHLIB"),
    (SHT_DYNSYM, "SHT_DYNSYM"),
    (SHT_INIT_ARRAY, "SHT_INIT_ARRAY"),
    (SHT_FINI_ARRAY, "SHT_FINI_ARRAY"),
    (SHT_PREINIT_ARRAY, "SHT_PREINIT_ARRAY"),
    (SHT_GROUP, "SHT_GROUP"),
    (SHT_SYMTAB_SHNDX, "SHT_SYMTAB_SHNDX"),
    (SHT_NUM, "SHT_NUM"),
    (SHT_QNXREL, "SHT_QNXREL"),
    (SHT_GNU_ATTRIBUTES, "SHT_GNU_ATTRIBUTES"),
    (SHT_GNU_HASH, "SHT_GNU_HASH"),
    (SHT_GNU_LIBLIST, "SHT_GNU_LIBLIST"),
    (SHT_GNU_CHECKSUM, "SHT_GNU_CHECKSUM"),
    (SHT_GNU_VERDEF, "SHT_GNU_VERDEF"),
    (SHT_GNU_VERNEED, "SHT_GNU_VERNEED"),
    (SHT_GNU_VERSYM, "SHT_GNU_VERSYM"),
    (SHT_ARM_EXIDX, "SHT_ARM_EXIDX"),
    (SHT_ARM_PREEMPTMAP, "SHT_ARM_PREEMPTMAP"),
    (SHT_ARM_ATTRIBUTES, "SHT_ARM_ATTRIBUTES"),
];

/// Type-specific contents of a section.
#[derive(Debug, Clone)]
pub enum SectionData<'a> {
    /// `SHT_NULL` and `SHT_NOBITS` occupy no file bytes
    NoBits,
    /// Any other type, exposed as raw bytes
    Generic(ByteView<'a>),
    StringTable(StringTable<'a>),
    /// `SHT_SYMTAB` or `SHT_DYNSYM`
    SymbolTable(SymbolTable<'a>),
    Notes(NoteTable<'a>),
}

/// One entry of the section header table.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    index: usize,
    pub header: SectionHeader,
    data: Result<SectionData<'a>>,
}

impl<'a> Section<'a> {
    /// Position of this section in the section header table.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name_index(&self) -> u32 {
        self.header.sh_name
    }

    pub fn sh_type(&self) -> u32 {
        self.header.sh_type
    }

    pub fn flags(&self) -> SectionFlags {
        SectionFlags::from_bits_retain(self.header.sh_flags)
    }

    pub fn addr(&self) -> u64 {
        self.header.sh_addr
    }

    pub fn offset(&self) -> u64 {
        self.header.sh_offset
    }

    pub fn size(&self) -> u64 {
        self.header.sh_size
    }

    pub fn link(&self) -> u32 {
        self.header.sh_link
    }

    pub fn info(&self) -> u32 {
        self.header.sh_info
    }

    pub fn addralign(&self) -> u64 {
        self.header.sh_addralign
    }

    pub fn entsize(&self) -> u64 {
        self.header.sh_entsize
    }

    pub fn is_executable(&self) -> bool {
        self.flags().contains(SectionFlags::EXEC)
    }

    pub fn is_writable(&self) -> bool {
        self.flags().contains(SectionFlags::WRITE)
    }

    pub fn type_string(&self) -> Cow<'static, str> {
        name_or_unknown(TYPE_NAMES, self.header.sh_type)
    }

    /// Hex flags followed by the names of the set bits, e.g. `0x00000006 ALLOC,EXEC`.
    pub fn flags_string(&self) -> String {
        let names: Vec<&str> = self.flags().iter_names().map(|(name, _)| name).collect();
        let mut out = format!("{:#010x}", self.header.sh_flags);
        if !names.is_empty() {
            out.push(' ');
            out.push_str(&names.join(","));
        }
        out
    }

    /// The decoded contents, or the error that stopped them decoding.
    pub fn data(&self) -> Result<&SectionData<'a>> {
        self.data.as_ref().map_err(Clone::clone)
    }

    /// The file bytes of this section, if it has any.
    pub fn view(&self) -> Option<ByteView<'a>> {
        match self.data.as_ref().ok()? {
            SectionData::NoBits => None,
            SectionData::Generic(view) => Some(*view),
            SectionData::StringTable(table) => Some(table.view()),
            SectionData::SymbolTable(table) => Some(table.view()),
            SectionData::Notes(table) => Some(table.view()),
        }
    }

    pub fn as_string_table(&self) -> Option<&StringTable<'a>> {
        match &self.data {
            Ok(SectionData::StringTable(table)) => Some(table),
            _ => None,
        }
    }

    pub fn as_symbol_table(&self) -> Option<&SymbolTable<'a>> {
        match &self.data {
            Ok(SectionData::SymbolTable(table)) => Some(table),
            _ => None,
        }
    }

    pub fn as_notes(&self) -> Option<&NoteTable<'a>> {
        match &self.data {
            Ok(SectionData::Notes(table)) => Some(table),
            _ => None,
        }
    }
}

/// The decoded section header table.
#[derive(Debug, Clone)]
pub struct SectionTable<'a> {
    sections: Vec<Section<'a>>,
    shstrndx: usize,
}

impl<'a> SectionTable<'a> {
    /// Decode the section header table described by `header`.
    ///
    /// Fails as a whole when the table's own geometry does not fit in the
    /// image. A section whose contents cannot be decoded keeps the error in
    /// its [`Section::data`] and does not affect its siblings.
    pub fn parse(image: &'a ByteImage, header: &FileHeader) -> Result<Self> {
        let class = header.class();
        let Some(first) = initial_section_header(image, header)? else {
            if header.e_shnum != 0 {
                warn!(shnum = header.e_shnum, "Section count set without a section table");
            }
            return Ok(Self {
                sections: Vec::new(),
                shstrndx: 0,
            });
        };

        // Extended numbering keeps the real values in section 0
        let count = if header.e_shnum == 0 {
            first.sh_size
        } else {
            header.e_shnum as u64
        };
        let shstrndx = if header.e_shstrndx == SHN_XINDEX {
            first.sh_link as usize
        } else {
            header.e_shstrndx as usize
        };

        let entsize = header.e_shentsize as u64;
        let table_size = count.checked_mul(entsize).ok_or(Error::OutOfBounds {
            offset: header.e_shoff,
            len: u64::MAX,
            size: image.len() as u64,
        })?;
        let table = image.view(header.e_shoff, table_size)?;

        let mut sections = Vec::with_capacity(count as usize);
        for index in 0..count as usize {
            let record = table.subview(index as u64 * entsize, class.section_header_size() as u64)?;
            let sh = parse_section_header(&record, class)?;
            let data = decode_data(image, class, &sh);
            if let Err(err) = &data {
                warn!(index, sh_type = sh.sh_type, error = %err, "Failed to decode section contents");
            }
            trace!(index, sh_type = sh.sh_type, offset = sh.sh_offset, size = sh.sh_size, "Decoded section");
            sections.push(Section {
                index,
                header: sh,
                data,
            });
        }

        debug!(
            offset = header.e_shoff,
            count = sections.len(),
            shstrndx,
            "Decoded section table"
        );
        Ok(Self { sections, shstrndx })
    }

    /// Count sections
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Index of the section holding section names.
    pub fn shstrndx(&self) -> usize {
        self.shstrndx
    }

    pub fn sections(&self) -> &[Section<'a>] {
        &self.sections
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Section<'a>> {
        self.sections.iter()
    }

    /// Get section by index
    pub fn section(&self, index: usize) -> Result<&Section<'a>> {
        self.sections.get(index).ok_or(Error::IndexOutOfRange {
            what: "section",
            index,
            count: self.sections.len(),
        })
    }

    /// The string table held by section `index`.
    pub fn string_table(&self, index: usize) -> Result<&StringTable<'a>> {
        match self.section(index)?.data()? {
            SectionData::StringTable(table) => Ok(table),
            _ => Err(Error::NotAStringTable { index }),
        }
    }

    /// Resolve `offset` in the string table held by section `index`.
    pub fn string(&self, index: usize, offset: usize) -> Result<&'a str> {
        self.string_table(index)?.string(offset)
    }

    /// The name of `section`, looked up in the section name table.
    ///
    /// Empty when the file has no section name table.
    pub fn section_name(&self, section: &Section<'_>) -> Result<&'a str> {
        if self.shstrndx == SHN_UNDEF as usize {
            return Ok("");
        }
        self.string(self.shstrndx, section.header.sh_name as usize)
    }

    /// Get section by name
    pub fn by_name(&self, name: &str) -> Option<&Section<'a>> {
        self.sections
            .iter()
            .find(|s| self.section_name(s).ok() == Some(name))
    }

    /// Every section decoded as a symbol table.
    pub fn symbol_tables(&self) -> impl Iterator<Item = (&Section<'a>, &SymbolTable<'a>)> + '_ {
        self.sections
            .iter()
            .filter_map(|s| s.as_symbol_table().map(|table| (s, table)))
    }
}

impl<'t, 'a> IntoIterator for &'t SectionTable<'a> {
    type Item = &'t Section<'a>;
    type IntoIter = std::slice::Iter<'t, Section<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read section 0, which carries the extended counts, if a table exists.
pub(crate) fn initial_section_header(
    image: &ByteImage,
    header: &FileHeader,
) -> Result<Option<SectionHeader>> {
    if header.e_shoff == 0 {
        return Ok(None);
    }
    let class = header.class();
    let expected = class.section_header_size();
    if (header.e_shentsize as usize) < expected {
        return Err(Error::InvalidEntrySize {
            table: "section header",
            expected,
            found: header.e_shentsize as usize,
        });
    }
    let record = image.view(header.e_shoff, expected as u64)?;
    parse_section_header(&record, class).map(Some)
}

/// Parse a single section header
pub fn parse_section_header(view: &ByteView<'_>, class: ElfClass) -> Result<SectionHeader> {
    match class {
        ElfClass::Elf32 => Ok(SectionHeader {
            sh_name: view.read_u32(0)?,
            sh_type: view.read_u32(4)?,
            sh_flags: read_word(view, 8, class)?,
            sh_addr: read_word(view, 12, class)?,
            sh_offset: read_word(view, 16, class)?,
            sh_size: read_word(view, 20, class)?,
            sh_link: view.read_u32(24)?,
            sh_info: view.read_u32(28)?,
            sh_addralign: read_word(view, 32, class)?,
            sh_entsize: read_word(view, 36, class)?,
        }),
        ElfClass::Elf64 => Ok(SectionHeader {
            sh_name: view.read_u32(0)?,
            sh_type: view.read_u32(4)?,
            sh_flags: read_word(view, 8, class)?,
            sh_addr: read_word(view, 16, class)?,
            sh_offset: read_word(view, 24, class)?,
            sh_size: read_word(view, 32, class)?,
            sh_link: view.read_u32(40)?,
            sh_info: view.read_u32(44)?,
            sh_addralign: read_word(view, 48, class)?,
            sh_entsize: read_word(view, 56, class)?,
        }),
    }
}

fn decode_data<'a>(image: &'a ByteImage, class: ElfClass, sh: &SectionHeader) -> Result<SectionData<'a>> {
    if matches!(sh.sh_type, SHT_NULL | SHT_NOBITS) {
        return Ok(SectionData::NoBits);
    }
    let view = image.view(sh.sh_offset, sh.sh_size)?;
    Ok(match sh.sh_type {
        SHT_STRTAB => SectionData::StringTable(StringTable::new(view)),
        SHT_SYMTAB | SHT_DYNSYM => {
            SectionData::SymbolTable(SymbolTable::parse(view, class, sh.sh_entsize, sh.sh_link)?)
        }
        SHT_NOTE => SectionData::Notes(NoteTable::parse(view)?),
        _ => SectionData::Generic(view),
    })
}
