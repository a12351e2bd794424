//! Synthesised ELF images for unit tests.

use crate::{ByteOrder, WordSize};

struct TestSegment {
    flags: u32,
    vaddr: u64,
    bytes: Vec<u8>,
}

/// Builds a minimal ELF file: header, program-header table, then segment bytes.
pub(crate) struct ElfBuilder {
    word_size: WordSize,
    byte_order: ByteOrder,
    machine: u8,
    entry: u64,
    phnum: Option<u16>,
    segments: Vec<TestSegment>,
}

impl ElfBuilder {
    pub(crate) fn new(word_size: WordSize, byte_order: ByteOrder) -> Self {
        Self {
            word_size,
            byte_order,
            machine: 0x3e,
            entry: 0,
            phnum: None,
            segments: Vec::new(),
        }
    }

    pub(crate) fn machine(mut self, machine: u8) -> Self {
        self.machine = machine;
        self
    }

    pub(crate) fn entry(mut self, entry: u64) -> Self {
        self.entry = entry;
        self
    }

    /// Override e_phnum regardless of the segments added.
    pub(crate) fn phnum(mut self, phnum: u16) -> Self {
        self.phnum = Some(phnum);
        self
    }

    pub(crate) fn segment(mut self, flags: u32, vaddr: u64, bytes: &[u8]) -> Self {
        self.segments.push(TestSegment {
            flags,
            vaddr,
            bytes: bytes.to_vec(),
        });
        self
    }

    fn header_size(&self) -> usize {
        match self.word_size {
            WordSize::Bits32 => 52,
            WordSize::Bits64 => 64,
        }
    }

    fn entry_size(&self) -> usize {
        match self.word_size {
            WordSize::Bits32 => 32,
            WordSize::Bits64 => 56,
        }
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let phoff = self.header_size();
        let data_start = phoff + self.entry_size() * self.segments.len();
        let data_len: usize = self.segments.iter().map(|s| s.bytes.len()).sum();
        let mut out = vec![0u8; data_start + data_len];

        out[..4].copy_from_slice(b"\x7fELF");
        out[4] = match self.word_size {
            WordSize::Bits32 => 1,
            WordSize::Bits64 => 2,
        };
        out[5] = match self.byte_order {
            ByteOrder::Little => 1,
            ByteOrder::Big => 2,
        };
        out[6] = 1;

        let phnum = self.phnum.unwrap_or(self.segments.len() as u16);
        let order = self.byte_order;
        match self.word_size {
            WordSize::Bits32 => {
                put(&mut out, 0x12, 2, self.machine as u64, order);
                put(&mut out, 0x18, 4, self.entry, order);
                put(&mut out, 0x1c, 4, phoff as u64, order);
                put(&mut out, 0x2a, 2, self.entry_size() as u64, order);
                put(&mut out, 0x2c, 2, phnum as u64, order);
            }
            WordSize::Bits64 => {
                put(&mut out, 0x12, 2, self.machine as u64, order);
                put(&mut out, 0x18, 8, self.entry, order);
                put(&mut out, 0x20, 8, phoff as u64, order);
                put(&mut out, 0x36, 2, self.entry_size() as u64, order);
                put(&mut out, 0x38, 2, phnum as u64, order);
            }
        }

        let mut data_offset = data_start;
        for (i, seg) in self.segments.iter().enumerate() {
            let entry = phoff + i * self.entry_size();
            let size = seg.bytes.len() as u64;
            match self.word_size {
                WordSize::Bits32 => {
                    put(&mut out, entry, 4, 1, order);
                    put(&mut out, entry + 0x04, 4, data_offset as u64, order);
                    put(&mut out, entry + 0x08, 4, seg.vaddr, order);
                    put(&mut out, entry + 0x10, 4, size, order);
                    put(&mut out, entry + 0x14, 4, size, order);
                    put(&mut out, entry + 0x18, 4, seg.flags as u64, order);
                }
                WordSize::Bits64 => {
                    put(&mut out, entry, 4, 1, order);
                    put(&mut out, entry + 0x04, 4, seg.flags as u64, order);
                    put(&mut out, entry + 0x08, 8, data_offset as u64, order);
                    put(&mut out, entry + 0x10, 8, seg.vaddr, order);
                    put(&mut out, entry + 0x20, 8, size, order);
                    put(&mut out, entry + 0x28, 8, size, order);
                }
            }
            out[data_offset..data_offset + seg.bytes.len()].copy_from_slice(&seg.bytes);
            data_offset += seg.bytes.len();
        }

        out
    }
}

/// Write `value` as a `width`-byte integer at `offset`.
pub(crate) fn put(buf: &mut [u8], offset: usize, width: usize, value: u64, order: ByteOrder) {
    let bytes = value.to_le_bytes();
    for i in 0..width {
        let pos = match order {
            ByteOrder::Little => offset + i,
            ByteOrder::Big => offset + width - 1 - i,
        };
        buf[pos] = bytes[i];
    }
}
