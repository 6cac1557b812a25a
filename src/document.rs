//! Loading input files into parsed JSON values.

use crate::error::{LeafError, Result};
use crate::xml;
use serde_json::Value;
use std::path::Path;

/// Input formats recognised by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    /// Detect the format from a file extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Format::Json),
            "xml" => Some(Format::Xml),
            _ => None,
        }
    }
}

/// Table name for a document: its file stem
pub fn table_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read and parse one input file
pub fn load(path: &Path) -> Result<Value> {
    let format = Format::from_path(path)
        .ok_or_else(|| LeafError::parse(format!("unsupported file type: {}", path.display())))?;

    let bytes = std::fs::read(path).map_err(|e| LeafError::read(path, e))?;
    match format {
        Format::Json => parse_json(bytes),
        Format::Xml => xml::to_json(xml::unescape_exported(&bytes).as_slice()),
    }
}

/// Parse JSON with the SIMD parser
pub fn parse_json(mut bytes: Vec<u8>) -> Result<Value> {
    simd_json::serde::from_slice::<Value>(&mut bytes).map_err(LeafError::parse)
}
