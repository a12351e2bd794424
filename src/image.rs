//! ELF executable image: the load pipeline and the resulting searchable image.

use crate::fields::HeaderField;
use crate::isa::{select_isa, Advisory, Isa};
use crate::parser::{detect_container, ElfReader};
use crate::segment::locate_executable_segments;
use crate::stream::instruction_stream;
use crate::trie::{ReverseInstructionTrie, DEFAULT_MAX_DEPTH};
use crate::{Address, ByteOrder, ExeError, Executable, WordSize};

/// Options accepted at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Select the compact (Thumb) mode on ARM binaries
    pub compact_mode: bool,
    /// Instructions indexed per stream position
    pub max_depth: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            compact_mode: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A loaded ELF executable with its gadget index.
///
/// Construction either fully succeeds or returns an error; the image is
/// immutable afterwards and can be searched from several threads.
#[derive(Debug)]
pub struct ElfImage {
    word_size: WordSize,
    byte_order: ByteOrder,
    isa: Isa,
    contents: Vec<u8>,
    program_header_table_offset: u64,
    entry_point: Address,
    executable_segments: usize,
    advisory: Option<Advisory>,
    reverse_instruction_trie: ReverseInstructionTrie,
}

impl ElfImage {
    /// Parse `contents` and index its executable segments.
    pub fn load(contents: Vec<u8>, options: &LoadOptions) -> Result<Self, ExeError> {
        let reader = ElfReader::new(&contents)?;
        // The header is read from its fixed offsets whatever the magic says
        if let Err(ExeError::UnsupportedFormat(kind)) = detect_container(&contents) {
            log::warn!("Magic bytes do not match ELF ({}), reading the header as ELF anyway", kind);
        }
        log::debug!(
            "ELF{} {} endian, {} bytes",
            reader.word_size(),
            reader.byte_order(),
            contents.len()
        );

        let machine = reader.read_field(HeaderField::Machine, 0)?;
        let selection = select_isa(machine, options.compact_mode)?;
        let isa = selection.isa;
        log::debug!("Machine 0x{:x} selects {}", machine, isa);

        let entry_point = reader.entry_point()?;
        let program_header_table_offset = reader.read_field(HeaderField::ProgramHeaderOffset, 0)?;

        let segments = locate_executable_segments(&reader)?;
        let stream = instruction_stream(&contents, &segments, isa);
        if stream.is_empty() {
            return Err(ExeError::NoExecutableSegments);
        }

        let word_size = reader.word_size();
        let byte_order = reader.byte_order();
        let reverse_instruction_trie = ReverseInstructionTrie::build(stream, options.max_depth);

        log::info!(
            "Loaded {} ELF{}: {} executable segment(s), {} instructions",
            isa,
            word_size,
            segments.len(),
            reverse_instruction_trie.len()
        );

        Ok(Self {
            word_size,
            byte_order,
            isa,
            contents,
            program_header_table_offset,
            entry_point,
            executable_segments: segments.len(),
            advisory: selection.advisory,
            reverse_instruction_trie,
        })
    }

    /// Guidance produced while selecting the ISA, for the caller to report.
    pub fn advisory(&self) -> Option<Advisory> {
        self.advisory
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    pub fn program_header_table_offset(&self) -> u64 {
        self.program_header_table_offset
    }

    pub fn executable_segment_count(&self) -> usize {
        self.executable_segments
    }

    pub fn instruction_count(&self) -> usize {
        self.reverse_instruction_trie.len()
    }

    /// The raw file contents
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }
}

impl Executable for ElfImage {
    fn file_type(&self) -> &'static str {
        "ELF"
    }

    fn word_size(&self) -> WordSize {
        self.word_size
    }

    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn isa(&self) -> Isa {
        self.isa
    }

    fn reverse_instruction_trie(&self) -> &ReverseInstructionTrie {
        &self.reverse_instruction_trie
    }
}
