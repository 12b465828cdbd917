use crate::common::{Class, ElfBuilder};
use elfview::formats::elf::types::*;
use elfview::{ByteImage, ByteOrder, Error, ErrorKind, FileHeader};

fn parse(data: &[u8]) -> elfview::Result<FileHeader> {
    let image = ByteImage::from_bytes(data.to_vec());
    FileHeader::parse(&image.full_view())
}

/// A header whose fields past the identification all hold distinct values.
fn sentinel_header(class: Class, big_endian: bool) -> Vec<u8> {
    let mut builder = ElfBuilder::new(class, big_endian);
    builder.e_type = ET_DYN;
    builder.machine = EM_AARCH64;
    builder.entry = 0x1122_3344;
    builder.flags = 0x5566_7788;
    builder.osabi = ELFOSABI_FREEBSD;
    builder.build()
}

#[test]
fn class_dispatch_reads_each_layout() {
    for big_endian in [false, true] {
        let data32 = sentinel_header(Class::Elf32, big_endian);
        let h32 = parse(&data32).unwrap();
        assert_eq!(h32.class(), ElfClass::Elf32);
        assert_eq!(h32.entry_point(), 0x1122_3344);
        assert_eq!(h32.e_flags, 0x5566_7788);
        assert_eq!(h32.e_ehsize, 52);
        assert_eq!(h32.e_phentsize, 32);
        assert_eq!(h32.e_shentsize, 40);
        assert_eq!(h32.e_shnum, 2);
        assert_eq!(h32.e_shstrndx, 1);
        assert_eq!(h32.e_phnum, 0);

        let data64 = sentinel_header(Class::Elf64, big_endian);
        let h64 = parse(&data64).unwrap();
        assert_eq!(h64.class(), ElfClass::Elf64);
        assert_eq!(h64.entry_point(), 0x1122_3344);
        assert_eq!(h64.e_flags, 0x5566_7788);
        assert_eq!(h64.e_ehsize, 64);
        assert_eq!(h64.e_phentsize, 56);
        assert_eq!(h64.e_shentsize, 64);
        assert_eq!(h64.e_shnum, 2);
        assert_eq!(h64.e_shstrndx, 1);

        // The section table offset differs per class; each must match its own layout
        assert_ne!(h32.e_shoff, 0);
        assert_ne!(h64.e_shoff, 0);
        assert_eq!(h32.e_shoff as usize + 2 * 40, data32.len());
        assert_eq!(h64.e_shoff as usize + 2 * 64, data64.len());

        for header in [h32, h64] {
            let expected = if big_endian {
                ByteOrder::Big
            } else {
                ByteOrder::Little
            };
            assert_eq!(header.byte_order(), expected);
            assert_eq!(header.type_string(), "ET_DYN");
            assert_eq!(header.machine_string(), "EM_AARCH64");
            assert_eq!(header.osabi_string(), "ELFOSABI_FREEBSD");
            assert_eq!(header.version(), 1);
        }
    }
}

#[test]
fn magic_mismatch_fails_for_every_length() {
    let valid = sentinel_header(Class::Elf64, false);
    for len in MIN_HEADER_SIZE..=valid.len() {
        for position in 0..4 {
            let mut data = valid[..len].to_vec();
            data[position] ^= 0xff;
            let err = parse(&data).unwrap_err();
            assert!(matches!(err, Error::InvalidMagic), "len {len}, byte {position}");
            assert_eq!(err.kind(), ErrorKind::Format);
        }
    }
}

#[test]
fn short_images_fail_regardless_of_magic() {
    let valid = sentinel_header(Class::Elf32, false);
    for len in 0..MIN_HEADER_SIZE {
        let err = parse(&valid[..len]).unwrap_err();
        assert!(matches!(err, Error::TooSmall { .. }), "len {len}");
        assert_eq!(err.kind(), ErrorKind::Format);
    }
    assert!(parse(&valid[..MIN_HEADER_SIZE]).is_ok());
}

#[test]
fn elf64_header_needs_its_full_size() {
    let valid = sentinel_header(Class::Elf64, true);
    assert!(parse(&valid[..63]).is_err());
    assert!(parse(&valid[..64]).is_ok());
}
