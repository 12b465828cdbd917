//! Utility functions for ELF parsing

use crate::error::Result;
use crate::formats::elf::types::ElfClass;
use crate::io::ByteView;
use std::borrow::Cow;
use std::fmt;

/// Read an address-sized word: 4 bytes for ELF32, 8 bytes for ELF64.
pub fn read_word(view: &ByteView<'_>, offset: usize, class: ElfClass) -> Result<u64> {
    match class {
        ElfClass::Elf32 => view.read_u32(offset).map(u64::from),
        ElfClass::Elf64 => view.read_u64(offset),
    }
}

/// Align a value up to the specified alignment
pub fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment == 0 || alignment == 1 {
        value
    } else {
        (value + alignment - 1) & !(alignment - 1)
    }
}

/// Label used for values missing from a name table.
pub fn unknown<T: fmt::LowerHex>(value: T) -> String {
    format!("unknown ({:#x})", value)
}

/// Look `value` up in a `(value, name)` table.
pub fn lookup<T: PartialEq + Copy>(table: &[(T, &'static str)], value: T) -> Option<&'static str> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == value)
        .map(|(_, name)| *name)
}

/// Name of `value` from `table`, or `unknown (0x…)`.
pub fn name_or_unknown<T>(table: &[(T, &'static str)], value: T) -> Cow<'static, str>
where
    T: PartialEq + Copy + fmt::LowerHex,
{
    match lookup(table, value) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(unknown(value)),
    }
}
