#![no_main]
use elfview::{ByteImage, ObjectFile};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut image = ByteImage::from_bytes(data.to_vec());
    let Ok(elf) = ObjectFile::parse(&mut image) else {
        return;
    };
    for section in elf.sections() {
        let _ = elf.section_name(section);
        let _ = section.type_string();
        let _ = section.flags_string();
        if let Some(strings) = section.as_string_table() {
            let _ = strings.strings().count();
        }
    }
    for (_, symbols) in elf.symbol_tables() {
        for symbol in symbols {
            let _ = elf.symbol_name(symbol);
            let _ = symbol.shndx_string();
        }
    }
    for segment in elf.segments() {
        let _ = segment.flags_string();
        if let Some(notes) = segment.as_notes() {
            let _ = notes.iter().map(|n| n.type_string()).count();
        }
    }
    let _ = elf.build_id();
    let _ = elf.interpreter();
});
