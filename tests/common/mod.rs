//! Common test utilities and helpers.
//!
//! Synthetic ELF images are built with [`ElfBuilder`] so that every test can
//! pick its class and byte order and know the exact expected values.

pub mod test_utils;

/// Layout constants of the two ELF classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Elf32,
    Elf64,
}

impl Class {
    pub fn ehdr_size(self) -> usize {
        match self {
            Class::Elf32 => 52,
            Class::Elf64 => 64,
        }
    }

    pub fn shdr_size(self) -> usize {
        match self {
            Class::Elf32 => 40,
            Class::Elf64 => 64,
        }
    }

    pub fn phdr_size(self) -> usize {
        match self {
            Class::Elf32 => 32,
            Class::Elf64 => 56,
        }
    }

    pub fn sym_size(self) -> usize {
        match self {
            Class::Elf32 => 16,
            Class::Elf64 => 24,
        }
    }
}

/// Byte writer honouring a fixed byte order.
#[derive(Debug, Clone)]
pub struct Writer {
    pub buf: Vec<u8>,
    big_endian: bool,
}

impl Writer {
    pub fn new(big_endian: bool) -> Self {
        Self {
            buf: Vec::new(),
            big_endian,
        }
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.buf.extend_from_slice(&bytes);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.buf.extend_from_slice(&bytes);
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        let bytes = if self.big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        self.buf.extend_from_slice(&bytes);
        self
    }

    /// Address-sized word of `class`.
    pub fn word(&mut self, class: Class, value: u64) -> &mut Self {
        match class {
            Class::Elf32 => self.u32(value as u32),
            Class::Elf64 => self.u64(value),
        }
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn align(&mut self, alignment: usize) -> &mut Self {
        while self.buf.len() % alignment != 0 {
            self.buf.push(0);
        }
        self
    }
}

/// A section to be emitted by [`ElfBuilder`].
#[derive(Debug, Clone, Default)]
pub struct SectionSpec {
    pub name: String,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub link: u32,
    pub info: u32,
    pub addralign: u64,
    pub entsize: u64,
    pub data: Vec<u8>,
    /// Declared size for sections without file data
    pub nobits_size: Option<u64>,
}

impl SectionSpec {
    pub fn new(name: &str, sh_type: u32, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            sh_type,
            addralign: 1,
            data,
            ..Self::default()
        }
    }
}

/// A segment to be emitted by [`ElfBuilder`].
#[derive(Debug, Clone, Default)]
pub struct SegmentSpec {
    pub p_type: u32,
    pub flags: u32,
    pub vaddr: u64,
    pub paddr: u64,
    pub memsz: u64,
    pub align: u64,
    pub data: Vec<u8>,
}

/// Offsets of the pieces of a built image.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub section_offsets: Vec<u64>,
    pub segment_offsets: Vec<u64>,
    pub shoff: u64,
    pub phoff: u64,
    pub shstrndx: usize,
}

/// Builds a complete ELF image from sections and segments.
///
/// Section 0 is the null section and the section name table is appended
/// after the given sections.
#[derive(Debug, Clone)]
pub struct ElfBuilder {
    pub class: Class,
    pub big_endian: bool,
    pub e_type: u16,
    pub machine: u16,
    pub entry: u64,
    pub flags: u32,
    pub osabi: u8,
    pub sections: Vec<SectionSpec>,
    pub segments: Vec<SegmentSpec>,
}

impl ElfBuilder {
    pub fn new(class: Class, big_endian: bool) -> Self {
        Self {
            class,
            big_endian,
            e_type: 1,
            machine: 62,
            entry: 0,
            flags: 0,
            osabi: 0,
            sections: Vec::new(),
            segments: Vec::new(),
        }
    }

    pub fn section(mut self, spec: SectionSpec) -> Self {
        self.sections.push(spec);
        self
    }

    pub fn segment(mut self, spec: SegmentSpec) -> Self {
        self.segments.push(spec);
        self
    }

    /// Section index a spec will get once built.
    pub fn index_of(&self, name: &str) -> u32 {
        self.sections
            .iter()
            .position(|s| s.name == name)
            .map(|i| i as u32 + 1)
            .unwrap_or(0)
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_with_layout().0
    }

    pub fn build_with_layout(&self) -> (Vec<u8>, Layout) {
        let class = self.class;
        let mut layout = Layout::default();

        // Section names, after the null entry
        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for spec in &self.sections {
            name_offsets.push(shstrtab.len() as u32);
            shstrtab.extend_from_slice(spec.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name = shstrtab.len() as u32;
        shstrtab.extend_from_slice(b".shstrtab\0");
        layout.shstrndx = self.sections.len() + 1;

        // Body: program headers, segment data, section data, name table
        let mut body = Writer::new(self.big_endian);
        body.bytes(&vec![0u8; class.ehdr_size()]);
        if !self.segments.is_empty() {
            body.align(8);
            layout.phoff = body.buf.len() as u64;
            body.bytes(&vec![0u8; self.segments.len() * class.phdr_size()]);
        }
        for spec in &self.segments {
            body.align(8);
            layout.segment_offsets.push(body.buf.len() as u64);
            body.bytes(&spec.data);
        }
        for spec in &self.sections {
            body.align(8);
            layout.section_offsets.push(body.buf.len() as u64);
            body.bytes(&spec.data);
        }
        let shstrtab_offset = body.buf.len() as u64;
        body.bytes(&shstrtab);
        body.align(8);
        layout.shoff = body.buf.len() as u64;

        // Section headers
        let mut shdrs = Writer::new(self.big_endian);
        shdrs.bytes(&vec![0u8; class.shdr_size()]);
        for (i, spec) in self.sections.iter().enumerate() {
            let size = spec.nobits_size.unwrap_or(spec.data.len() as u64);
            write_shdr(
                &mut shdrs,
                class,
                [
                    name_offsets[i] as u64,
                    spec.sh_type as u64,
                    spec.flags,
                    spec.addr,
                    layout.section_offsets[i],
                    size,
                    spec.link as u64,
                    spec.info as u64,
                    spec.addralign,
                    spec.entsize,
                ],
            );
        }
        write_shdr(
            &mut shdrs,
            class,
            [
                shstrtab_name as u64,
                3,
                0,
                0,
                shstrtab_offset,
                shstrtab.len() as u64,
                0,
                0,
                1,
                0,
            ],
        );
        body.bytes(&shdrs.buf);

        // Program headers
        let mut phdrs = Writer::new(self.big_endian);
        for (i, spec) in self.segments.iter().enumerate() {
            let offset = layout.segment_offsets[i];
            let filesz = spec.data.len() as u64;
            match class {
                Class::Elf32 => {
                    phdrs
                        .u32(spec.p_type)
                        .word(class, offset)
                        .word(class, spec.vaddr)
                        .word(class, spec.paddr)
                        .word(class, filesz)
                        .word(class, spec.memsz)
                        .u32(spec.flags)
                        .word(class, spec.align);
                }
                Class::Elf64 => {
                    phdrs
                        .u32(spec.p_type)
                        .u32(spec.flags)
                        .word(class, offset)
                        .word(class, spec.vaddr)
                        .word(class, spec.paddr)
                        .word(class, filesz)
                        .word(class, spec.memsz)
                        .word(class, spec.align);
                }
            }
        }
        let phoff = layout.phoff as usize;
        body.buf[phoff..phoff + phdrs.buf.len()].copy_from_slice(&phdrs.buf);

        // File header
        let mut ehdr = Writer::new(self.big_endian);
        ehdr.bytes(b"\x7fELF")
            .u8(match class {
                Class::Elf32 => 1,
                Class::Elf64 => 2,
            })
            .u8(if self.big_endian { 2 } else { 1 })
            .u8(1)
            .u8(self.osabi)
            .bytes(&[0u8; 8])
            .u16(self.e_type)
            .u16(self.machine)
            .u32(1)
            .word(class, self.entry)
            .word(class, layout.phoff)
            .word(class, layout.shoff)
            .u32(self.flags)
            .u16(class.ehdr_size() as u16)
            .u16(class.phdr_size() as u16)
            .u16(self.segments.len() as u16)
            .u16(class.shdr_size() as u16)
            .u16(self.sections.len() as u16 + 2)
            .u16(layout.shstrndx as u16);
        body.buf[..ehdr.buf.len()].copy_from_slice(&ehdr.buf);

        (body.buf, layout)
    }
}

/// Section header fields in declaration order:
/// name, type, flags, addr, offset, size, link, info, addralign, entsize.
fn write_shdr(w: &mut Writer, class: Class, f: [u64; 10]) {
    w.u32(f[0] as u32)
        .u32(f[1] as u32)
        .word(class, f[2])
        .word(class, f[3])
        .word(class, f[4])
        .word(class, f[5])
        .u32(f[6] as u32)
        .u32(f[7] as u32)
        .word(class, f[8])
        .word(class, f[9]);
}

/// One encoded symbol record.
#[allow(clippy::too_many_arguments)]
pub fn symbol(
    class: Class,
    big_endian: bool,
    name: u32,
    value: u64,
    size: u64,
    info: u8,
    other: u8,
    shndx: u16,
) -> Vec<u8> {
    let mut w = Writer::new(big_endian);
    match class {
        Class::Elf32 => {
            w.u32(name)
                .u32(value as u32)
                .u32(size as u32)
                .u8(info)
                .u8(other)
                .u16(shndx);
        }
        Class::Elf64 => {
            w.u32(name).u8(info).u8(other).u16(shndx).u64(value).u64(size);
        }
    }
    w.buf
}

/// One encoded note record with its padding.
pub fn note(big_endian: bool, name: &[u8], n_type: u32, desc: &[u8]) -> Vec<u8> {
    let mut w = Writer::new(big_endian);
    w.u32(name.len() as u32)
        .u32(desc.len() as u32)
        .u32(n_type)
        .bytes(name)
        .align(4)
        .bytes(desc)
        .align(4);
    w.buf
}
