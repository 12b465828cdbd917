//! Symbol table parsing

use crate::demangle;
use crate::error::{Error, Result};
use crate::formats::elf::sections::SectionTable;
use crate::formats::elf::types::*;
use crate::formats::elf::utils::lookup;
use crate::io::ByteView;
use std::borrow::Cow;
use tracing::{debug, warn};

const BIND_NAMES: &[(u8, &str)] = &[
    (STB_LOCAL, "LOCAL"),
    (STB_GLOBAL, "GLOBAL"),
    (STB_WEAK, "WEAK"),
];

const TYPE_NAMES: &[(u8, &str)] = &[
    (STT_NOTYPE, "NOTYPE"),
    (STT_OBJECT, "OBJECT"),
    (STT_FUNC, "FUNC"),
    (STT_SECTION, "SECTION"),
    (STT_FILE, "FILE"),
    (STT_COMMON, "COMMON"),
    (STT_TLS, "TLS"),
    (STT_NUM, "NUM"),
];

const VISIBILITY_NAMES: &[(u8, &str)] = &[
    (STV_DEFAULT, "DEFAULT"),
    (STV_INTERNAL, "INTERNAL"),
    (STV_HIDDEN, "HIDDEN"),
    (STV_PROTECTED, "PROTECTED"),
];

const SHNDX_NAMES: &[(u16, &str)] = &[(SHN_ABS, "ABS"), (SHN_COMMON, "COMMON")];

/// One decoded symbol record.
///
/// The record layout is chosen from the owning object's class when the
/// symbol is decoded and stays fixed for the symbol's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub st_name: u32,
    pub st_value: u64,
    pub st_size: u64,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
    /// Section holding this symbol's names
    link: u32,
    class: ElfClass,
}

impl Symbol {
    /// Decode a symbol record from the start of `view`.
    pub fn parse(view: &ByteView<'_>, class: ElfClass, link: u32) -> Result<Self> {
        match class {
            ElfClass::Elf32 => decode32(view, link),
            ElfClass::Elf64 => decode64(view, link),
        }
    }

    pub fn class(&self) -> ElfClass {
        self.class
    }

    /// Index of the string table section this symbol's name lives in.
    pub fn link(&self) -> u32 {
        self.link
    }

    pub fn bind(&self) -> u8 {
        self.st_info >> 4
    }

    pub fn sym_type(&self) -> u8 {
        self.st_info & 0xf
    }

    pub fn visibility(&self) -> u8 {
        self.st_other & 0x3
    }

    pub fn is_undefined(&self) -> bool {
        self.st_shndx == SHN_UNDEF
    }

    pub fn is_global(&self) -> bool {
        matches!(self.bind(), STB_GLOBAL | STB_WEAK)
    }

    pub fn is_function(&self) -> bool {
        self.sym_type() == STT_FUNC
    }

    pub fn bind_string(&self) -> &'static str {
        lookup(BIND_NAMES, self.bind()).unwrap_or("NONE")
    }

    pub fn type_string(&self) -> &'static str {
        lookup(TYPE_NAMES, self.sym_type()).unwrap_or("(OTHER)")
    }

    pub fn visibility_string(&self) -> &'static str {
        lookup(VISIBILITY_NAMES, self.visibility()).unwrap_or("(OTHER)")
    }

    /// `UNDEF`, the decimal section index, `ABS`, `COMMON`, or `OTHER`.
    pub fn shndx_string(&self) -> Cow<'static, str> {
        match self.st_shndx {
            SHN_UNDEF => Cow::Borrowed("UNDEF"),
            index if index < SHN_LORESERVE => Cow::Owned(index.to_string()),
            reserved => Cow::Borrowed(lookup(SHNDX_NAMES, reserved).unwrap_or("OTHER")),
        }
    }

    /// The symbol's name, resolved through its linked string table.
    ///
    /// Empty when `st_name` is zero.
    pub fn name<'a>(&self, sections: &SectionTable<'a>) -> Result<&'a str> {
        if self.st_name == 0 {
            return Ok("");
        }
        sections.string(self.link as usize, self.st_name as usize)
    }

    /// The demangled name, or `None` if the name is not a Rust or C++ mangling.
    pub fn demangled_name(&self, sections: &SectionTable<'_>) -> Option<String> {
        let name = self.name(sections).ok()?;
        demangle::demangle_one(name).map(|r| r.demangled)
    }
}

fn decode32(view: &ByteView<'_>, link: u32) -> Result<Symbol> {
    Ok(Symbol {
        st_name: view.read_u32(0)?,
        st_value: view.read_u32(4)? as u64,
        st_size: view.read_u32(8)? as u64,
        st_info: view.read_u8(12)?,
        st_other: view.read_u8(13)?,
        st_shndx: view.read_u16(14)?,
        link,
        class: ElfClass::Elf32,
    })
}

fn decode64(view: &ByteView<'_>, link: u32) -> Result<Symbol> {
    Ok(Symbol {
        st_name: view.read_u32(0)?,
        st_info: view.read_u8(4)?,
        st_other: view.read_u8(5)?,
        st_shndx: view.read_u16(6)?,
        st_value: view.read_u64(8)?,
        st_size: view.read_u64(16)?,
        link,
        class: ElfClass::Elf64,
    })
}

/// The records of one `SHT_SYMTAB` or `SHT_DYNSYM` section.
#[derive(Debug, Clone)]
pub struct SymbolTable<'a> {
    view: ByteView<'a>,
    link: u32,
    symbols: Vec<Symbol>,
}

impl<'a> SymbolTable<'a> {
    /// Decode every whole record in `view`.
    ///
    /// `entsize` is the section's declared entry size; zero means "use the
    /// class record size", anything smaller than it is rejected. A trailing
    /// partial record is ignored.
    pub fn parse(view: ByteView<'a>, class: ElfClass, entsize: u64, link: u32) -> Result<Self> {
        let record_size = class.symbol_size();
        if entsize != 0 && entsize < record_size as u64 {
            return Err(Error::InvalidEntrySize {
                table: "symbol",
                expected: record_size,
                found: entsize as usize,
            });
        }

        let count = view.len() / record_size;
        if view.len() % record_size != 0 {
            warn!(
                offset = view.offset(),
                size = view.len(),
                record_size,
                "Symbol table size is not a multiple of the record size"
            );
        }

        let mut symbols = Vec::with_capacity(count);
        for k in 0..count {
            let record = view.subview((k * record_size) as u64, record_size as u64)?;
            symbols.push(Symbol::parse(&record, class, link)?);
        }

        debug!(offset = view.offset(), count, link, "Decoded symbol table");
        Ok(Self {
            view,
            link,
            symbols,
        })
    }

    pub fn view(&self) -> ByteView<'a> {
        self.view
    }

    /// Index of the associated string table section.
    pub fn link(&self) -> u32 {
        self.link
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }

    /// Get symbol by index
    pub fn symbol(&self, index: usize) -> Result<&Symbol> {
        self.symbols.get(index).ok_or(Error::IndexOutOfRange {
            what: "symbol",
            index,
            count: self.symbols.len(),
        })
    }

    /// Find the first symbol with the given name.
    pub fn by_name(&self, sections: &SectionTable<'a>, name: &str) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|s| s.st_name != 0 && s.name(sections).ok() == Some(name))
    }
}

impl<'t> IntoIterator for &'t SymbolTable<'_> {
    type Item = &'t Symbol;
    type IntoIter = std::slice::Iter<'t, Symbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
