//! Objects produced by an independent ELF writer, decoded by both readers.

use crate::common::note;
use elfview::formats::elf::types::*;
use elfview::{ByteImage, ByteOrder, ObjectFile};
use object::write;
use object::{
    Architecture, BinaryFormat, Endianness, Object, ObjectSection, ObjectSymbol, SectionKind,
    SymbolFlags, SymbolKind, SymbolScope,
};

const BUILD_ID: [u8; 4] = [0x0b, 0xad, 0xf0, 0x0d];

fn write_object(arch: Architecture, endian: Endianness) -> Vec<u8> {
    let mut obj = write::Object::new(BinaryFormat::Elf, arch, endian);

    let text = obj.add_section(Vec::new(), b".text".to_vec(), SectionKind::Text);
    obj.append_section_data(text, &[0u8; 48], 16);
    let data = obj.add_section(Vec::new(), b".data".to_vec(), SectionKind::Data);
    obj.append_section_data(data, &[1u8; 12], 4);

    let big_endian = endian == Endianness::Big;
    let notes = obj.add_section(Vec::new(), b".note.gnu.build-id".to_vec(), SectionKind::Note);
    obj.append_section_data(notes, &note(big_endian, b"GNU\0", NT_GNU_BUILD_ID, &BUILD_ID), 4);

    for (name, value, size) in [("alpha", 0u64, 16u64), ("beta", 16, 32)] {
        obj.add_symbol(write::Symbol {
            name: name.as_bytes().to_vec(),
            value,
            size,
            kind: SymbolKind::Text,
            scope: SymbolScope::Linkage,
            weak: false,
            section: write::SymbolSection::Section(text),
            flags: SymbolFlags::None,
        });
    }
    obj.add_symbol(write::Symbol {
        name: b"gamma".to_vec(),
        value: 4,
        size: 8,
        kind: SymbolKind::Data,
        scope: SymbolScope::Dynamic,
        weak: true,
        section: write::SymbolSection::Section(data),
        flags: SymbolFlags::None,
    });

    obj.write().unwrap()
}

fn crosscheck(arch: Architecture, endian: Endianness) {
    let bytes = write_object(arch, endian);
    let reference = object::File::parse(&*bytes).unwrap();

    let mut image = ByteImage::from_bytes(bytes.clone());
    let elf = ObjectFile::parse(&mut image).unwrap();

    let expected_order = match endian {
        Endianness::Little => ByteOrder::Little,
        Endianness::Big => ByteOrder::Big,
    };
    assert_eq!(elf.image().byte_order(), expected_order);
    assert_eq!(elf.header().is_64(), reference.is_64());
    assert_eq!(elf.header().type_string(), "ET_REL");

    for section in reference.sections() {
        let ours = elf.section(section.index().0).unwrap();
        assert_eq!(elf.section_name(ours).unwrap(), section.name().unwrap());
        assert_eq!(ours.size(), section.size());
        assert_eq!(ours.addr(), section.address());
        assert_eq!(ours.addralign(), section.align());
    }

    let (_, symbols) = elf
        .symbol_tables()
        .find(|(s, _)| s.sh_type() == SHT_SYMTAB)
        .unwrap();
    let mut seen = 0;
    for symbol in reference.symbols() {
        let ours = symbols.symbol(symbol.index().0).unwrap();
        assert_eq!(elf.symbol_name(ours).unwrap(), symbol.name().unwrap());
        assert_eq!(ours.st_value, symbol.address());
        assert_eq!(ours.st_size, symbol.size());
        assert_eq!(ours.is_undefined(), symbol.is_undefined());
        seen += 1;
    }
    assert!(seen >= 3);

    for name in ["alpha", "beta", "gamma"] {
        assert!(symbols.by_name(elf.sections(), name).is_some(), "{name}");
    }
    let gamma = symbols.by_name(elf.sections(), "gamma").unwrap();
    assert_eq!(gamma.bind_string(), "WEAK");
    assert_eq!(gamma.type_string(), "OBJECT");

    assert_eq!(reference.build_id().unwrap(), Some(&BUILD_ID[..]));
    assert_eq!(elf.build_id(), Some(&BUILD_ID[..]));
}

#[test]
fn crosscheck_x86_64_little_endian() {
    crosscheck(Architecture::X86_64, Endianness::Little);
}

#[test]
fn crosscheck_aarch64_little_endian() {
    crosscheck(Architecture::Aarch64, Endianness::Little);
}

#[test]
fn crosscheck_mips_big_endian() {
    crosscheck(Architecture::Mips, Endianness::Big);
}

#[test]
fn crosscheck_i386_little_endian() {
    crosscheck(Architecture::I386, Endianness::Little);
}
