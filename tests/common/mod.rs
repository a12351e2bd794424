//! Minimal ELF files for driving the `iago` binary.

use std::fs;
use std::path::{Path, PathBuf};

/// A 64-bit little-endian ELF with one PF_X segment holding `code` at `vaddr`.
pub fn elf64(machine: u16, vaddr: u64, code: &[u8]) -> Vec<u8> {
    let phoff = 64usize;
    let data = phoff + 56;
    let mut out = vec![0u8; data + code.len()];

    out[..4].copy_from_slice(b"\x7fELF");
    out[4] = 2;
    out[5] = 1;
    out[6] = 1;
    out[0x12..0x14].copy_from_slice(&machine.to_le_bytes());
    out[0x18..0x20].copy_from_slice(&vaddr.to_le_bytes());
    out[0x20..0x28].copy_from_slice(&(phoff as u64).to_le_bytes());
    out[0x36..0x38].copy_from_slice(&56u16.to_le_bytes());
    out[0x38..0x3a].copy_from_slice(&1u16.to_le_bytes());

    let entry = phoff;
    out[entry..entry + 4].copy_from_slice(&1u32.to_le_bytes());
    out[entry + 0x04..entry + 0x08].copy_from_slice(&5u32.to_le_bytes());
    out[entry + 0x08..entry + 0x10].copy_from_slice(&(data as u64).to_le_bytes());
    out[entry + 0x10..entry + 0x18].copy_from_slice(&vaddr.to_le_bytes());
    out[entry + 0x20..entry + 0x28].copy_from_slice(&(code.len() as u64).to_le_bytes());
    out[entry + 0x28..entry + 0x30].copy_from_slice(&(code.len() as u64).to_le_bytes());

    out[data..].copy_from_slice(code);
    out
}

/// Write `contents` into `dir` and return the path.
pub fn write_binary(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write test binary");
    path
}
