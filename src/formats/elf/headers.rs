//! ELF header parsing

use crate::error::{Error, Result};
use crate::formats::elf::types::*;
use crate::formats::elf::utils::name_or_unknown;
use crate::io::{ByteOrder, ByteView};
use std::borrow::Cow;

const TYPE_NAMES: &[(u16, &str)] = &[
    (ET_NONE, "ET_NONE"),
    (ET_REL, "ET_REL"),
    (ET_EXEC, "ET_EXEC"),
    (ET_DYN, "ET_DYN"),
    (ET_CORE, "ET_CORE"),
];

const MACHINE_NAMES: &[(u16, &str)] = &[
    (EM_NONE, "EM_NONE"),
    (EM_M32, "EM_M32"),
    (EM_SPARC, "EM_SPARC"),
    (EM_386, "EM_386"),
    (EM_68K, "EM_68K"),
    (EM_88K, "EM_88K"),
    (EM_860, "EM_860"),
    (EM_MIPS, "EM_MIPS"),
    (EM_PPC, "EM_PPC"),
    (EM_PPC64, "EM_PPC64"),
    (EM_S390, "EM_S390"),
    (EM_ARM, "EM_ARM"),
    (EM_SPARCV9, "EM_SPARCV9"),
    (EM_IA_64, "EM_IA_64"),
    (EM_X86_64, "EM_X86_64"),
    (EM_MMIX, "EM_MMIX"),
    (EM_AARCH64, "EM_AARCH64"),
    (EM_AVR32, "EM_AVR32"),
    (EM_CUDA, "EM_CUDA"),
    (EM_RISCV, "EM_RISCV"),
    (EM_LOONGARCH, "EM_LOONGARCH"),
];

const OSABI_NAMES: &[(u8, &str)] = &[
    (ELFOSABI_SYSV, "ELFOSABI_SYSV"),
    (ELFOSABI_HPUX, "ELFOSABI_HPUX"),
    (ELFOSABI_NETBSD, "ELFOSABI_NETBSD"),
    (ELFOSABI_GNU, "ELFOSABI_GNU"),
    (ELFOSABI_HURD, "ELFOSABI_HURD"),
    (ELFOSABI_86OPEN, "ELFOSABI_86OPEN"),
    (ELFOSABI_SOLARIS, "ELFOSABI_SOLARIS"),
    (ELFOSABI_AIX, "ELFOSABI_AIX"),
    (ELFOSABI_IRIX, "ELFOSABI_IRIX"),
    (ELFOSABI_FREEBSD, "ELFOSABI_FREEBSD"),
    (ELFOSABI_TRU64, "ELFOSABI_TRU64"),
    (ELFOSABI_MODESTO, "ELFOSABI_MODESTO"),
    (ELFOSABI_OPENBSD, "ELFOSABI_OPENBSD"),
    (ELFOSABI_OPENVMS, "ELFOSABI_OPENVMS"),
    (ELFOSABI_NSK, "ELFOSABI_NSK"),
    (ELFOSABI_AROS, "ELFOSABI_AROS"),
    (ELFOSABI_FENIXOS, "ELFOSABI_FENIXOS"),
    (ELFOSABI_ARM_AEABI, "ELFOSABI_ARM_AEABI"),
    (ELFOSABI_ARM, "ELFOSABI_ARM"),
    (ELFOSABI_STANDALONE, "ELFOSABI_STANDALONE"),
];

/// ELF identification (first 16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfIdent {
    pub class: ElfClass,
    pub data: ElfData,
    pub version: u8,
    pub osabi: u8,
    pub abiversion: u8,
}

impl ElfIdent {
    /// Parse the identification bytes.
    ///
    /// Only single bytes are read, so the result does not depend on the
    /// view's byte order.
    pub fn parse(view: &ByteView<'_>) -> Result<Self> {
        if view.len() < MIN_HEADER_SIZE {
            return Err(Error::TooSmall {
                needed: MIN_HEADER_SIZE,
                found: view.len(),
            });
        }

        if view.slice(0, ELF_MAGIC.len())? != ELF_MAGIC {
            return Err(Error::InvalidMagic);
        }

        Ok(Self {
            class: ElfClass::from_u8(view.read_u8(4)?)?,
            data: ElfData::from_u8(view.read_u8(5)?)?,
            version: view.read_u8(6)?,
            osabi: view.read_u8(7)?,
            abiversion: view.read_u8(8)?,
        })
    }
}

/// The decoded ELF file header.
///
/// Every field past the 16-byte identification is read from the layout of
/// the header's own class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub ident: ElfIdent,
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    pub e_shstrndx: u16,
}

impl FileHeader {
    /// Parse the header at the start of `view`.
    ///
    /// Fails when the view is shorter than [`MIN_HEADER_SIZE`] (or than the
    /// 64-bit header for ELF64), when the magic does not match, or when the
    /// class or data encoding is not recognised. Multi-byte fields are read
    /// in the byte order named by the identification, whatever the image's
    /// current order.
    pub fn parse(view: &ByteView<'_>) -> Result<Self> {
        let ident = ElfIdent::parse(view)?;

        let needed = ident.class.header_size();
        if view.len() < needed {
            return Err(Error::TooSmall {
                needed,
                found: view.len(),
            });
        }

        let order = ident.data.byte_order();
        match ident.class {
            ElfClass::Elf32 => parse_header32(view, ident, order),
            ElfClass::Elf64 => parse_header64(view, ident, order),
        }
    }

    pub fn class(&self) -> ElfClass {
        self.ident.class
    }

    pub fn data(&self) -> ElfData {
        self.ident.data
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.ident.data.byte_order()
    }

    pub fn is_64(&self) -> bool {
        self.ident.class == ElfClass::Elf64
    }

    pub fn osabi(&self) -> u8 {
        self.ident.osabi
    }

    pub fn object_type(&self) -> u16 {
        self.e_type
    }

    pub fn machine(&self) -> u16 {
        self.e_machine
    }

    pub fn version(&self) -> u32 {
        self.e_version
    }

    pub fn entry_point(&self) -> u64 {
        self.e_entry
    }

    pub fn is_pie(&self) -> bool {
        self.e_type == ET_DYN
    }

    pub fn class_string(&self) -> &'static str {
        self.ident.class.name()
    }

    pub fn data_string(&self) -> &'static str {
        self.ident.data.name()
    }

    pub fn osabi_string(&self) -> Cow<'static, str> {
        name_or_unknown(OSABI_NAMES, self.ident.osabi)
    }

    pub fn type_string(&self) -> Cow<'static, str> {
        name_or_unknown(TYPE_NAMES, self.e_type)
    }

    pub fn machine_string(&self) -> Cow<'static, str> {
        name_or_unknown(MACHINE_NAMES, self.e_machine)
    }
}

fn parse_header32(view: &ByteView<'_>, ident: ElfIdent, order: ByteOrder) -> Result<FileHeader> {
    Ok(FileHeader {
        ident,
        e_type: view.read_u16_as(16, order)?,
        e_machine: view.read_u16_as(18, order)?,
        e_version: view.read_u32_as(20, order)?,
        e_entry: view.read_u32_as(24, order)? as u64,
        e_phoff: view.read_u32_as(28, order)? as u64,
        e_shoff: view.read_u32_as(32, order)? as u64,
        e_flags: view.read_u32_as(36, order)?,
        e_ehsize: view.read_u16_as(40, order)?,
        e_phentsize: view.read_u16_as(42, order)?,
        e_phnum: view.read_u16_as(44, order)?,
        e_shentsize: view.read_u16_as(46, order)?,
        e_shnum: view.read_u16_as(48, order)?,
        e_shstrndx: view.read_u16_as(50, order)?,
    })
}

fn parse_header64(view: &ByteView<'_>, ident: ElfIdent, order: ByteOrder) -> Result<FileHeader> {
    Ok(FileHeader {
        ident,
        e_type: view.read_u16_as(16, order)?,
        e_machine: view.read_u16_as(18, order)?,
        e_version: view.read_u32_as(20, order)?,
        e_entry: view.read_u64_as(24, order)?,
        e_phoff: view.read_u64_as(32, order)?,
        e_shoff: view.read_u64_as(40, order)?,
        e_flags: view.read_u32_as(48, order)?,
        e_ehsize: view.read_u16_as(52, order)?,
        e_phentsize: view.read_u16_as(54, order)?,
        e_phnum: view.read_u16_as(56, order)?,
        e_shentsize: view.read_u16_as(58, order)?,
        e_shnum: view.read_u16_as(60, order)?,
        e_shstrndx: view.read_u16_as(62, order)?,
    })
}
