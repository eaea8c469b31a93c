//! JSON document reading
//!
//! Every JSON file the pipeline consumes goes through here so that syntax
//! and shape errors point at the offending line.

pub mod diagnostics;

pub use diagnostics::{JsonError, JsonSyntaxError};

use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Parse a JSON document from text
pub fn parse_document<T: DeserializeOwned>(source: &str, filename: &str) -> Result<T, JsonError> {
    serde_json::from_str(source)
        .map_err(|e| JsonSyntaxError::from_serde_error(&e, source, filename).into())
}

/// Read and parse a JSON document from disk
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, JsonError> {
    let source = fs::read_to_string(path).map_err(|source| JsonError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&source, &path.display().to_string())
}

/// Write a value as pretty JSON followed by a newline
pub fn write_pretty<W: Write, T: serde::Serialize>(mut writer: W, value: &T) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()
}
