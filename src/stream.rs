//! Flattens executable segments into a stream of fixed-width instruction tokens.

use crate::isa::Isa;
use crate::{Address, Instruction, Segment};

/// Slice every segment into `isa.instruction_size()` byte tokens.
///
/// Opcodes are hex encoded in file order, with no byte-order
/// reinterpretation, so search targets must be given in file order too.
/// A trailing remainder shorter than one instruction is dropped.
/// Addresses wrap at the top of the 64-bit address space.
///
/// Segments must lie inside `contents`; the segment locator guarantees this.
pub fn instruction_stream(contents: &[u8], segments: &[Segment], isa: Isa) -> Vec<Instruction> {
    let instruction_size = isa.instruction_size();
    let capacity = segments.iter().map(|s| s.size / instruction_size).sum();
    let mut stream = Vec::with_capacity(capacity);

    for segment in segments {
        let end = segment.offset.checked_add(segment.size);
        let Some(bytes) = end.and_then(|end| contents.get(segment.offset..end)) else {
            log::warn!("Segment at 0x{:x} lies outside the file, skipping", segment.vaddr);
            continue;
        };

        for (i, chunk) in bytes.chunks_exact(instruction_size).enumerate() {
            stream.push(Instruction {
                opcode: hex::encode(chunk),
                vaddr: segment.vaddr.wrapping_add((i * instruction_size) as Address),
            });
        }
    }

    stream
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(vaddr: Address, offset: usize, size: usize) -> Segment {
        Segment { vaddr, offset, size }
    }

    #[test]
    fn test_byte_tokens() {
        let contents = [0x55, 0x48, 0x89, 0xe5, 0xc3];
        let stream = instruction_stream(&contents, &[seg(0x1000, 0, 5)], Isa::X86_64);

        assert_eq!(stream.len(), 5);
        assert_eq!(stream[0].opcode, "55");
        assert_eq!(stream[4].opcode, "c3");
        assert_eq!(stream[4].vaddr, 0x1004);
    }

    #[test]
    fn test_file_order_hex() {
        // `ret` on little-endian AArch64
        let contents = [0xc0, 0x03, 0x5f, 0xd6];
        let stream = instruction_stream(&contents, &[seg(0x400000, 0, 4)], Isa::AArch64);
        assert_eq!(stream.len(), 1);
        assert_eq!(stream[0].opcode, "c0035fd6");
    }

    #[test]
    fn test_trailing_bytes_dropped() {
        let contents = [0u8; 11];
        let stream = instruction_stream(&contents, &[seg(0x8000, 0, 11)], Isa::Arm);
        assert_eq!(stream.len(), 2);
        assert_eq!(stream[1].vaddr, 0x8004);

        let thumb = instruction_stream(&contents, &[seg(0x8000, 0, 11)], Isa::Thumb);
        assert_eq!(thumb.len(), 5);
    }

    #[test]
    fn test_segments_concatenate_in_order() {
        let contents = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let segments = [seg(0x2000, 4, 2), seg(0x1000, 0, 3)];
        let stream = instruction_stream(&contents, &segments, Isa::X86);

        let addrs: Vec<_> = stream.iter().map(|i| i.vaddr).collect();
        assert_eq!(addrs, vec![0x2000, 0x2001, 0x1000, 0x1001, 0x1002]);
        assert_eq!(stream[0].opcode, "05");
        assert_eq!(stream[2].opcode, "01");
    }

    #[test]
    fn test_addresses_wrap_at_top_of_address_space() {
        let contents = [0x5f, 0xc3, 0x90, 0xc3];
        let stream = instruction_stream(&contents, &[seg(u64::MAX - 1, 0, 4)], Isa::X86_64);

        let addrs: Vec<_> = stream.iter().map(|i| i.vaddr).collect();
        assert_eq!(addrs, vec![u64::MAX - 1, u64::MAX, 0, 1]);
    }

    #[test]
    fn test_empty_segment() {
        let stream = instruction_stream(&[0u8; 4], &[seg(0x1000, 0, 0)], Isa::X86);
        assert!(stream.is_empty());
    }
}
