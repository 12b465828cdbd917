//! Note section and segment parsing

use crate::error::{Error, Result};
use crate::formats::elf::types::*;
use crate::formats::elf::utils::{align_up, name_or_unknown};
use crate::io::ByteView;
use std::borrow::Cow;
use tracing::{debug, trace, warn};

const GNU_NOTE_NAMES: &[(u32, &str)] = &[
    (NT_GNU_ABI_TAG, "NT_GNU_ABI_TAG"),
    (NT_GNU_HWCAP, "NT_GNU_HWCAP"),
    (NT_GNU_BUILD_ID, "NT_GNU_BUILD_ID"),
    (NT_GNU_GOLD_VERSION, "NT_GNU_GOLD_VERSION"),
    (NT_GNU_PROPERTY_TYPE_0, "NT_GNU_PROPERTY_TYPE_0"),
];

const CORE_NOTE_NAMES: &[(u32, &str)] = &[
    (NT_PRSTATUS, "NT_PRSTATUS"),
    (NT_PRFPREG, "NT_PRFPREG"),
    (NT_PRPSINFO, "NT_PRPSINFO"),
    (NT_TASKSTRUCT, "NT_TASKSTRUCT"),
    (NT_AUXV, "NT_AUXV"),
    (NT_SIGINFO, "NT_SIGINFO"),
    (NT_FILE, "NT_FILE"),
    (NT_PRXFPREG, "NT_PRXFPREG"),
];

/// Individual note entry
#[derive(Debug, Clone, Copy)]
pub struct Note<'a> {
    /// Owner name, without the terminating NUL
    pub name: &'a str,
    pub n_type: u32,
    /// Descriptor bytes, without padding
    pub desc: ByteView<'a>,
    /// Offset of the record relative to the start of its note region
    pub offset: usize,
}

impl<'a> Note<'a> {
    /// Name of the note type, interpreted according to its owner.
    pub fn type_string(&self) -> Cow<'static, str> {
        match self.name {
            "GNU" => name_or_unknown(GNU_NOTE_NAMES, self.n_type),
            "CORE" | "LINUX" => name_or_unknown(CORE_NOTE_NAMES, self.n_type),
            _ => name_or_unknown(&[], self.n_type),
        }
    }

    pub fn is_build_id(&self) -> bool {
        self.name == "GNU" && self.n_type == NT_GNU_BUILD_ID
    }
}

/// The notes of one note section or segment, in file order.
#[derive(Debug, Clone)]
pub struct NoteTable<'a> {
    view: ByteView<'a>,
    notes: Vec<Note<'a>>,
}

impl<'a> NoteTable<'a> {
    /// Decode every note record in `view`.
    ///
    /// A tail shorter than a note header is ignored. A record whose name or
    /// descriptor would run past the end of the region fails the whole table
    /// with [`Error::MalformedNote`].
    pub fn parse(view: ByteView<'a>) -> Result<Self> {
        let mut notes = Vec::new();
        let mut offset = 0usize;

        while view.len() - offset >= NOTE_HEADER_SIZE {
            let n_namesz = view.read_u32(offset)? as usize;
            let n_descsz = view.read_u32(offset + 4)? as usize;
            let n_type = view.read_u32(offset + 8)?;

            let name_start = offset + NOTE_HEADER_SIZE;
            let remaining = view.len() - name_start;
            if n_namesz > remaining {
                return Err(Error::MalformedNote {
                    offset: view.offset() + offset,
                    message: format!("name size {n_namesz:#x} exceeds remaining {remaining:#x} bytes"),
                });
            }
            let name = if n_namesz > 0 {
                view.string(name_start, n_namesz)?
            } else {
                ""
            };

            // The padding after the last record may be missing.
            let desc_start = (align_up((name_start + n_namesz) as u64, 4) as usize).min(view.len());
            let remaining = view.len() - desc_start;
            if n_descsz > remaining {
                return Err(Error::MalformedNote {
                    offset: view.offset() + offset,
                    message: format!("descriptor size {n_descsz:#x} exceeds remaining {remaining:#x} bytes"),
                });
            }
            let desc = view.subview(desc_start as u64, n_descsz as u64)?;

            trace!(offset, name, n_type, n_descsz, "Decoded note");
            notes.push(Note {
                name,
                n_type,
                desc,
                offset,
            });

            offset = (align_up((desc_start + n_descsz) as u64, 4) as usize).min(view.len());
        }

        if offset < view.len() {
            warn!(
                offset = view.offset() + offset,
                trailing = view.len() - offset,
                "Ignoring trailing bytes in note region"
            );
        }
        debug!(offset = view.offset(), count = notes.len(), "Decoded note table");

        Ok(Self { view, notes })
    }

    pub fn view(&self) -> ByteView<'a> {
        self.view
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Get all notes
    pub fn notes(&self) -> &[Note<'a>] {
        &self.notes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note<'a>> {
        self.notes.iter()
    }

    /// Get build ID if present
    pub fn build_id(&self) -> Option<&'a [u8]> {
        self.notes
            .iter()
            .find(|n| n.is_build_id())
            .map(|n| n.desc.bytes())
    }
}

impl<'t, 'a> IntoIterator for &'t NoteTable<'a> {
    type Item = &'t Note<'a>;
    type IntoIter = std::slice::Iter<'t, Note<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
