//! ELF header reader driven by the static field table.

use goblin::Hint;

use crate::fields::{FieldTable, HeaderField};
use crate::{ByteOrder, ExeError, WordSize};

/// Size of the identification block at the start of every ELF file
pub const IDENT_SIZE: usize = 16;

/// Offset of EI_CLASS
const CLASS_OFFSET: usize = 0x04;
/// Offset of EI_DATA
const DATA_OFFSET: usize = 0x05;

/// Sniff the container kind from the identification block.
///
/// Goblin's magic sniffing tells ELF apart from PE, Mach-O and archives.
/// Loading does not depend on the result; the header fields are read from
/// their fixed offsets regardless.
pub fn detect_container(contents: &[u8]) -> Result<(), ExeError> {
    let ident: &[u8; IDENT_SIZE] = contents
        .get(..IDENT_SIZE)
        .and_then(|b| b.try_into().ok())
        .ok_or(ExeError::OutOfBounds {
            field: "identification",
            offset: 0,
            size: IDENT_SIZE as u64,
            len: contents.len(),
        })?;

    match goblin::peek_bytes(ident) {
        Ok(Hint::Elf(_)) => Ok(()),
        Ok(Hint::PE) => Err(ExeError::UnsupportedFormat("PE".into())),
        Ok(Hint::Mach(_)) | Ok(Hint::MachFat(_)) => Err(ExeError::UnsupportedFormat("Mach-O".into())),
        Ok(Hint::Archive) => Err(ExeError::UnsupportedFormat("archive".into())),
        Ok(Hint::Unknown(magic)) => {
            Err(ExeError::UnsupportedFormat(format!("unknown magic {:#018x}", magic)))
        }
        Ok(_) => Err(ExeError::UnsupportedFormat("unrecognised container".into())),
        Err(e) => Err(ExeError::UnsupportedFormat(e.to_string())),
    }
}

/// Read the word size from EI_CLASS: 1 is 32-bit, 2 is 64-bit.
pub fn detect_word_size(contents: &[u8]) -> Result<WordSize, ExeError> {
    match ident_byte(contents, CLASS_OFFSET, HeaderField::Class)? {
        1 => Ok(WordSize::Bits32),
        2 => Ok(WordSize::Bits64),
        value => Err(ExeError::InvalidFormat {
            field: HeaderField::Class.name(),
            value,
        }),
    }
}

/// Read the byte order from EI_DATA: 1 is little endian, 2 is big endian.
pub fn detect_byte_order(contents: &[u8]) -> Result<ByteOrder, ExeError> {
    match ident_byte(contents, DATA_OFFSET, HeaderField::Data)? {
        1 => Ok(ByteOrder::Little),
        2 => Ok(ByteOrder::Big),
        value => Err(ExeError::InvalidFormat {
            field: HeaderField::Data.name(),
            value,
        }),
    }
}

fn ident_byte(contents: &[u8], offset: usize, field: HeaderField) -> Result<u8, ExeError> {
    contents.get(offset).copied().ok_or(ExeError::OutOfBounds {
        field: field.name(),
        offset: offset as u64,
        size: 1,
        len: contents.len(),
    })
}

/// Decodes header and program-header fields from a raw ELF buffer.
#[derive(Debug, Clone, Copy)]
pub struct ElfReader<'a> {
    contents: &'a [u8],
    word_size: WordSize,
    byte_order: ByteOrder,
}

impl<'a> ElfReader<'a> {
    /// Detect word size and byte order and build a reader over `contents`.
    pub fn new(contents: &'a [u8]) -> Result<Self, ExeError> {
        let word_size = detect_word_size(contents)?;
        let byte_order = detect_byte_order(contents)?;
        Ok(Self::with_layout(contents, word_size, byte_order))
    }

    /// Build a reader with an already known layout.
    pub fn with_layout(contents: &'a [u8], word_size: WordSize, byte_order: ByteOrder) -> Self {
        Self {
            contents,
            word_size,
            byte_order,
        }
    }

    pub fn word_size(&self) -> WordSize {
        self.word_size
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn contents(&self) -> &'a [u8] {
        self.contents
    }

    /// Read `field` at `base_offset` plus the field's offset for this word size.
    ///
    /// `base_offset` is zero for file header fields and the start of the
    /// entry for program-header fields.
    pub fn read_field<F: FieldTable>(&self, field: F, base_offset: u64) -> Result<u64, ExeError> {
        let (offset, size) = field.descriptor().layout(self.word_size);
        let out_of_bounds = || ExeError::OutOfBounds {
            field: field.name(),
            offset: base_offset.saturating_add(offset as u64),
            size: size as u64,
            len: self.contents.len(),
        };

        let start = usize::try_from(base_offset)
            .ok()
            .and_then(|base| base.checked_add(offset))
            .ok_or_else(out_of_bounds)?;
        let end = start.checked_add(size).ok_or_else(out_of_bounds)?;
        let bytes = self.contents.get(start..end).ok_or_else(out_of_bounds)?;

        Ok(decode_unsigned(bytes, self.byte_order))
    }

    /// e_entry
    pub fn entry_point(&self) -> Result<u64, ExeError> {
        self.read_field(HeaderField::Entry, 0)
    }
}

/// Decode an unsigned integer of up to 8 bytes.
fn decode_unsigned(bytes: &[u8], byte_order: ByteOrder) -> u64 {
    let push = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
    match byte_order {
        ByteOrder::Little => bytes.iter().rev().fold(0, push),
        ByteOrder::Big => bytes.iter().fold(0, push),
    }
}
