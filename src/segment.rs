//! Program-header walk that finds the executable segments.

use crate::fields::{HeaderField, ProgramHeaderField};
use crate::parser::ElfReader;
use crate::{ExeError, Segment};

/// PF_X
const EXECUTABLE_FLAG: u64 = 0x1;

/// Return every segment whose PF_X bit is set, in program-header order.
///
/// Any field that cannot be read aborts the walk; there is no partial result.
pub fn locate_executable_segments(reader: &ElfReader<'_>) -> Result<Vec<Segment>, ExeError> {
    let table_offset = reader.read_field(HeaderField::ProgramHeaderOffset, 0)?;
    let entry_size = reader.read_field(HeaderField::ProgramHeaderEntrySize, 0)?;
    let num_entries = reader.read_field(HeaderField::ProgramHeaderCount, 0)?;

    if num_entries == 0 {
        return Err(ExeError::EmptyProgramHeaderTable);
    }
    log::debug!(
        "Program header table at 0x{:x}: {} entries of {} bytes",
        table_offset, num_entries, entry_size
    );

    let mut segments = Vec::new();
    for index in 0..num_entries {
        let entry_offset = index
            .checked_mul(entry_size)
            .and_then(|rel| rel.checked_add(table_offset))
            .ok_or(ExeError::OutOfBounds {
                field: "program header table entry",
                offset: table_offset,
                size: entry_size,
                len: reader.contents().len(),
            })?;

        let flags = reader.read_field(ProgramHeaderField::Flags, entry_offset)?;
        if flags & EXECUTABLE_FLAG == 0 {
            continue;
        }

        let offset = reader.read_field(ProgramHeaderField::Offset, entry_offset)?;
        let vaddr = reader.read_field(ProgramHeaderField::VirtualAddress, entry_offset)?;
        let size = reader.read_field(ProgramHeaderField::FileSize, entry_offset)?;

        let segment = checked_segment(vaddr, offset, size, reader.contents().len())?;
        log::debug!(
            "Executable segment {} at 0x{:x} (file offset 0x{:x}, {} bytes)",
            index, segment.vaddr, segment.offset, segment.size
        );
        segments.push(segment);
    }

    Ok(segments)
}

/// Build a segment, rejecting file ranges that run past the buffer.
fn checked_segment(vaddr: u64, offset: u64, size: u64, len: usize) -> Result<Segment, ExeError> {
    let out_of_bounds = ExeError::OutOfBounds {
        field: "segment contents",
        offset,
        size,
        len,
    };
    let (Ok(offset), Ok(size)) = (usize::try_from(offset), usize::try_from(size)) else {
        return Err(out_of_bounds);
    };
    match offset.checked_add(size) {
        Some(end) if end <= len => Ok(Segment { vaddr, offset, size }),
        _ => Err(out_of_bounds),
    }
}
