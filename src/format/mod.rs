//! Output formats for image information and search results

mod json;

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

use crate::image::ElfImage;
use crate::{Address, ExeError, Executable};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output (default)
    Text,
    /// Pretty-printed JSON
    Json,
    /// JSON Lines format (one JSON object per line)
    JsonLines,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonLines => write!(f, "json-lines"),
        }
    }
}

impl OutputFormat {
    /// Get a formatter for this output format
    pub fn get_formatter(&self) -> Box<dyn ReportFormatter> {
        match self {
            OutputFormat::Text => Box::new(TextFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
            OutputFormat::JsonLines => Box::new(JsonLinesFormatter),
        }
    }
}

/// Identity metadata of a loaded image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub file_type: String,
    pub arch: u32,
    pub isa: String,
    pub endianness: String,
    pub entry_point: String,
    pub executable_segments: usize,
    pub instructions: usize,
}

impl ImageInfo {
    pub fn from_image(image: &ElfImage) -> Self {
        Self {
            file_type: image.file_type().to_string(),
            arch: image.word_size().bits(),
            isa: image.isa().name().to_string(),
            endianness: image.byte_order().to_string(),
            entry_point: hex_address(image.entry_point()),
            executable_segments: image.executable_segment_count(),
            instructions: image.instruction_count(),
        }
    }
}

/// Outcome of one gadget search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindResult {
    pub gadget: String,
    pub found: bool,
    /// Matching virtual addresses as `0x` prefixed hex
    pub addresses: Vec<String>,
}

impl FindResult {
    pub fn new(gadget: &str, addresses: Vec<Address>) -> Self {
        Self {
            gadget: gadget.to_string(),
            found: !addresses.is_empty(),
            addresses: addresses.into_iter().map(hex_address).collect(),
        }
    }
}

fn hex_address(addr: Address) -> String {
    format!("0x{:x}", addr)
}

/// Formatter trait for reports
pub trait ReportFormatter {
    /// Format image information
    fn format_info(&self, info: &ImageInfo) -> Result<String, ExeError>;

    /// Format the results of one or more searches
    fn format_results(&self, results: &[FindResult]) -> Result<String, ExeError>;
}

/// Format reports as plain text
pub struct TextFormatter;

/// Format reports as pretty JSON
pub struct JsonFormatter;

/// Format reports as JSON Lines
pub struct JsonLinesFormatter;

impl ReportFormatter for TextFormatter {
    fn format_info(&self, info: &ImageInfo) -> Result<String, ExeError> {
        let mut output = String::new();
        output.push_str(&format!("  File Type: {}\n", info.file_type));
        output.push_str(&format!("  Arch: {}\n", info.arch));
        output.push_str(&format!("  ISA: {}\n", info.isa));
        output.push_str(&format!("  Endianness: {}\n", info.endianness));
        output.push_str(&format!("  Entry Point: {}\n", info.entry_point));
        output.push_str(&format!("  Executable Segments: {}\n", info.executable_segments));
        output.push_str(&format!("  Instructions: {}\n", info.instructions));
        Ok(output)
    }

    fn format_results(&self, results: &[FindResult]) -> Result<String, ExeError> {
        let mut output = String::new();
        for result in results {
            if !result.found {
                output.push_str(&format!("{}: {}\n", result.gadget, ExeError::NotFound));
                continue;
            }
            let addresses = result
                .addresses
                .iter()
                .map(|a| a.trim_start_matches("0x"))
                .collect::<Vec<_>>()
                .join(", ");
            if results.len() == 1 {
                output.push_str(&format!("virtual address: {}\n", addresses));
            } else {
                output.push_str(&format!("{}: virtual address: {}\n", result.gadget, addresses));
            }
        }
        Ok(output)
    }
}
