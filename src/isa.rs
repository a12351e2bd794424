//! Instruction-set registry keyed by the ELF machine identifier.

use std::fmt;

use crate::ExeError;

/// e_machine value of 32-bit ARM, the one ISA with a compact (Thumb) mode
pub const EM_ARM: u64 = 0x28;

/// Supported instruction sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Isa {
    /// 32-bit x86
    X86,
    /// 64-bit x86
    X86_64,
    /// ARM in its 4-byte A32 mode
    Arm,
    /// ARM in its 2-byte Thumb mode
    Thumb,
    AArch64,
    Mips,
    PowerPc,
    PowerPc64,
    Sparc,
    RiscV,
}

/// Addressing mode of an instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsaMode {
    Default,
    Compact,
}

/// Static facts about one instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsaDescriptor {
    pub name: &'static str,
    /// Width of one instruction token in bytes
    pub instruction_size: usize,
    pub mode: IsaMode,
}

impl Isa {
    pub const fn descriptor(self) -> IsaDescriptor {
        // x86 is variable width, so every byte offset is a token boundary
        let (name, instruction_size, mode) = match self {
            Isa::X86 => ("x86", 1, IsaMode::Default),
            Isa::X86_64 => ("x86-64", 1, IsaMode::Default),
            Isa::Arm => ("ARM", 4, IsaMode::Default),
            Isa::Thumb => ("Thumb", 2, IsaMode::Compact),
            Isa::AArch64 => ("AArch64", 4, IsaMode::Default),
            Isa::Mips => ("MIPS", 4, IsaMode::Default),
            Isa::PowerPc => ("PowerPC", 4, IsaMode::Default),
            Isa::PowerPc64 => ("PowerPC64", 4, IsaMode::Default),
            Isa::Sparc => ("SPARC", 4, IsaMode::Default),
            Isa::RiscV => ("RISC-V", 4, IsaMode::Default),
        };
        IsaDescriptor {
            name,
            instruction_size,
            mode,
        }
    }

    pub const fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub const fn instruction_size(self) -> usize {
        self.descriptor().instruction_size
    }

    pub const fn mode(self) -> IsaMode {
        self.descriptor().mode
    }

    /// Default-mode ISA for an ELF machine identifier.
    pub const fn from_machine(machine: u64) -> Option<Isa> {
        match machine {
            0x03 => Some(Isa::X86),
            0x3e => Some(Isa::X86_64),
            EM_ARM => Some(Isa::Arm),
            0xb7 => Some(Isa::AArch64),
            0x08 => Some(Isa::Mips),
            0x14 => Some(Isa::PowerPc),
            0x15 => Some(Isa::PowerPc64),
            0x02 | 0x2b => Some(Isa::Sparc),
            0xf3 => Some(Isa::RiscV),
            _ => None,
        }
    }
}

impl fmt::Display for Isa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Guidance about the compact-mode hint. Never changes the outcome of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// An ARM binary was loaded without the hint
    CompactModeAvailable,
    /// The hint was given for an ISA without a compact mode
    CompactHintIgnored,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::CompactModeAvailable => {
                write!(f, "ARM binary detected. To target thumb mode re-load using the --thumb flag")
            }
            Advisory::CompactHintIgnored => {
                write!(f, "--thumb flag ignored: --thumb flag should only be used on ARM binaries")
            }
        }
    }
}

/// Outcome of ISA selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsaSelection {
    pub isa: Isa,
    pub advisory: Option<Advisory>,
}

/// Pick the ISA for `machine`, honouring the compact-mode hint.
///
/// Reporting the advisory is left to the caller.
pub fn select_isa(machine: u64, compact_hint: bool) -> Result<IsaSelection, ExeError> {
    let isa = Isa::from_machine(machine).ok_or(ExeError::UnsupportedIsa(machine))?;

    let selection = match (machine == EM_ARM, compact_hint) {
        (true, true) => IsaSelection {
            isa: Isa::Thumb,
            advisory: None,
        },
        (true, false) => IsaSelection {
            isa,
            advisory: Some(Advisory::CompactModeAvailable),
        },
        (false, true) => IsaSelection {
            isa,
            advisory: Some(Advisory::CompactHintIgnored),
        },
        (false, false) => IsaSelection { isa, advisory: None },
    };
    Ok(selection)
}
