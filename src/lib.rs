//! Core types, traits, and errors for the iago ROP gadget locator.
//!
//! The crate reads an ELF executable, flattens its executable segments into a
//! stream of fixed-width instruction tokens, and indexes that stream in a
//! reverse instruction trie so a gadget's byte sequence can be located in time
//! proportional to the gadget length.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use std::fs;
//! use iago::{image::{ElfImage, LoadOptions}, Executable};
//!
//! let contents = fs::read("path/to/binary").unwrap();
//! let image = ElfImage::load(contents, &LoadOptions::default()).unwrap();
//!
//! // `pop rdi; ret` on x86-64
//! match image.find("5fc3") {
//!     Ok(vaddr) => println!("virtual address: {:x}", vaddr),
//!     Err(e) => println!("{}", e),
//! }
//! ```

pub mod fields;
pub mod parser;
pub mod isa;
pub mod segment;
pub mod stream;
pub mod trie;
pub mod image;
pub mod session;
pub mod format;
#[cfg(test)]
mod testutil;

use std::fmt;

use crate::isa::Isa;
use crate::trie::ReverseInstructionTrie;

/// Represents a virtual address in the loaded image
pub type Address = u64;

/// Width of the header fields, taken from the ELF class byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordSize {
    /// ELFCLASS32
    Bits32,
    /// ELFCLASS64
    Bits64,
}

impl WordSize {
    /// Number of bits, 32 or 64.
    pub fn bits(self) -> u32 {
        match self {
            WordSize::Bits32 => 32,
            WordSize::Bits64 => 64,
        }
    }
}

impl fmt::Display for WordSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Byte order of multi-byte header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Little => write!(f, "little"),
            ByteOrder::Big => write!(f, "big"),
        }
    }
}

/// An executable byte range declared by the program-header table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Virtual address the segment is mapped at
    pub vaddr: Address,
    /// Offset of the segment's bytes in the file
    pub offset: usize,
    /// Number of bytes the segment occupies in the file
    pub size: usize,
}

/// One fixed-width instruction token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Lowercase hex of the instruction bytes, in file order
    pub opcode: String,
    /// Virtual address of the first byte
    pub vaddr: Address,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}: {}", self.vaddr, self.opcode)
    }
}

/// A loaded executable that can be searched for gadgets.
pub trait Executable: Send + Sync {
    /// Container kind, e.g. "ELF"
    fn file_type(&self) -> &'static str;

    /// Word size of the header layout
    fn word_size(&self) -> WordSize;

    /// Byte order of the header fields
    fn byte_order(&self) -> ByteOrder;

    /// Instruction set selected at load time
    fn isa(&self) -> Isa;

    /// The index built over the executable segments
    fn reverse_instruction_trie(&self) -> &ReverseInstructionTrie;

    /// Locate `gadget` (hex, file byte order) and return its first virtual address.
    fn find(&self, gadget: &str) -> Result<Address, ExeError> {
        self.reverse_instruction_trie().find(gadget, self.isa())
    }

    /// Every virtual address at which `gadget` occurs, in file order.
    fn find_all(&self, gadget: &str) -> Result<Vec<Address>, ExeError> {
        self.reverse_instruction_trie().find_all(gadget, self.isa())
    }
}

/// Error type for loading and searching executables
#[derive(Debug, thiserror::Error)]
pub enum ExeError {
    /// A header byte outside its expected domain
    #[error("invalid ELF file: {field} value {value:#x} is not recognised")]
    InvalidFormat { field: &'static str, value: u8 },

    /// A declared offset and width exceed the buffer
    #[error("invalid ELF file: {field} at offset {offset:#x} ({size} bytes) lies outside the {len}-byte file")]
    OutOfBounds {
        field: &'static str,
        offset: u64,
        size: u64,
        len: usize,
    },

    #[error("invalid ELF file: empty program header table")]
    EmptyProgramHeaderTable,

    #[error("no executable segments found")]
    NoExecutableSegments,

    /// Machine identifier missing from the ISA registry
    #[error("unsupported ISA: machine id {0:#x}")]
    UnsupportedIsa(u64),

    /// Container other than ELF
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("gadget not found")]
    NotFound,

    /// Gadget text that is not hexadecimal
    #[error("malformed gadget {0:?}: expected hex encoded machine code")]
    MalformedGadget(String),

    #[error("no target file specified")]
    NoImageLoaded,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_size_display() {
        assert_eq!(WordSize::Bits32.to_string(), "32");
        assert_eq!(WordSize::Bits64.bits(), 64);
    }

    #[test]
    fn test_byte_order_display() {
        assert_eq!(ByteOrder::Little.to_string(), "little");
        assert_eq!(ByteOrder::Big.to_string(), "big");
    }

    #[test]
    fn test_instruction_display() {
        let insn = Instruction {
            opcode: "c3".to_string(),
            vaddr: 0x401000,
        };
        assert_eq!(insn.to_string(), "0x00401000: c3");
    }

    #[test]
    fn test_error_messages() {
        let err = ExeError::InvalidFormat { field: "class", value: 3 };
        assert_eq!(err.to_string(), "invalid ELF file: class value 0x3 is not recognised");
        assert_eq!(ExeError::UnsupportedIsa(0x99).to_string(), "unsupported ISA: machine id 0x99");
        assert_eq!(ExeError::NoImageLoaded.to_string(), "no target file specified");
    }
}
