//! Offsets and widths of the ELF fields the loader reads.

use crate::WordSize;

/// Location of one field for both header layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub offset32: usize,
    pub offset64: usize,
    pub size32: usize,
    pub size64: usize,
}

impl FieldDescriptor {
    const fn new(offset32: usize, offset64: usize, size32: usize, size64: usize) -> Self {
        Self { offset32, offset64, size32, size64 }
    }

    /// `(offset, width)` for the given word size.
    pub const fn layout(&self, word_size: WordSize) -> (usize, usize) {
        match word_size {
            WordSize::Bits32 => (self.offset32, self.size32),
            WordSize::Bits64 => (self.offset64, self.size64),
        }
    }
}

/// A table of named fields, either the file header or a program-header entry.
pub trait FieldTable: Copy {
    /// Where the field lives
    fn descriptor(self) -> FieldDescriptor;

    /// Human readable field name used in error messages
    fn name(self) -> &'static str;
}

/// Fields of the ELF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    /// EI_CLASS, the word size indicator
    Class,
    /// EI_DATA, the byte order indicator
    Data,
    /// e_machine, read at its full two-byte width so big-endian images
    /// decode the same identifier as little-endian ones.
    ///
    /// A non-zero high byte is part of the identifier: a little-endian
    /// header holding 0x013e is machine 0x13e, not x86-64.
    Machine,
    Entry,
    ProgramHeaderOffset,
    ProgramHeaderEntrySize,
    ProgramHeaderCount,
}

impl FieldTable for HeaderField {
    fn descriptor(self) -> FieldDescriptor {
        match self {
            HeaderField::Class => FieldDescriptor::new(0x04, 0x04, 1, 1),
            HeaderField::Data => FieldDescriptor::new(0x05, 0x05, 1, 1),
            HeaderField::Machine => FieldDescriptor::new(0x12, 0x12, 2, 2),
            HeaderField::Entry => FieldDescriptor::new(0x18, 0x18, 4, 8),
            HeaderField::ProgramHeaderOffset => FieldDescriptor::new(0x1c, 0x20, 4, 8),
            HeaderField::ProgramHeaderEntrySize => FieldDescriptor::new(0x2a, 0x36, 2, 2),
            HeaderField::ProgramHeaderCount => FieldDescriptor::new(0x2c, 0x38, 2, 2),
        }
    }

    fn name(self) -> &'static str {
        match self {
            HeaderField::Class => "class",
            HeaderField::Data => "data encoding",
            HeaderField::Machine => "machine",
            HeaderField::Entry => "entry point",
            HeaderField::ProgramHeaderOffset => "program header table offset",
            HeaderField::ProgramHeaderEntrySize => "program header table entry size",
            HeaderField::ProgramHeaderCount => "program header table num entries",
        }
    }
}

/// Fields of one program-header table entry, relative to the entry start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramHeaderField {
    SegmentType,
    Flags,
    Offset,
    VirtualAddress,
    FileSize,
    MemorySize,
}

impl FieldTable for ProgramHeaderField {
    fn descriptor(self) -> FieldDescriptor {
        match self {
            ProgramHeaderField::SegmentType => FieldDescriptor::new(0x00, 0x00, 4, 4),
            ProgramHeaderField::Flags => FieldDescriptor::new(0x18, 0x04, 4, 4),
            ProgramHeaderField::Offset => FieldDescriptor::new(0x04, 0x08, 4, 8),
            ProgramHeaderField::VirtualAddress => FieldDescriptor::new(0x08, 0x10, 4, 8),
            ProgramHeaderField::FileSize => FieldDescriptor::new(0x10, 0x20, 4, 8),
            ProgramHeaderField::MemorySize => FieldDescriptor::new(0x14, 0x28, 4, 8),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ProgramHeaderField::SegmentType => "segment type",
            ProgramHeaderField::Flags => "flags",
            ProgramHeaderField::Offset => "segment offset",
            ProgramHeaderField::VirtualAddress => "virtual address",
            ProgramHeaderField::FileSize => "file size",
            ProgramHeaderField::MemorySize => "mem size",
        }
    }
}
