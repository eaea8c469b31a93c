//! Pipeline stages - activity builders and the merger
//!
//! Each builder turns one raw source into canonical [`Activity`] records,
//! resolving names through a shared [`ReferenceContext`](crate::core::ReferenceContext).

pub mod hxl;
pub mod iati;
pub mod merge;
pub mod stats;
pub mod threew;

use miette::Diagnostic;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::reference::ReferenceError;
use crate::entities::activity::Activity;
use crate::json::JsonError;

/// Structural errors that abort a pipeline stage
#[derive(Debug, Error, Diagnostic)]
pub enum PipelineError {
    #[error("cannot read {}: {source}", path.display())]
    #[diagnostic(code(aidmap::pipeline::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: no HXL hashtag row found", path.display())]
    #[diagnostic(
        code(aidmap::threew::hashtags),
        help("3W spreadsheets need a row of HXL hashtags (e.g. #org+impl, #adm1+name) below the column headers")
    )]
    NoHashtags { path: PathBuf },

    #[error("{}: invalid CSV: {message}", path.display())]
    #[diagnostic(code(aidmap::threew::csv))]
    Csv { path: PathBuf, message: String },

    #[error("{}: {message}", path.display())]
    #[diagnostic(
        code(aidmap::pipeline::activities),
        help("activity files are JSON arrays of activities or objects keyed by identifier")
    )]
    Activities { path: PathBuf, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Json(#[from] JsonError),
}

/// Read an activity file: either a JSON array or a catalog keyed by identifier
pub fn read_activities(path: &Path) -> Result<Vec<Activity>, PipelineError> {
    let doc: Value = crate::json::read_document(path)?;
    let invalid = |what: String, e: serde_json::Error| PipelineError::Activities {
        path: path.to_path_buf(),
        message: format!("invalid activity {}: {}", what, e),
    };

    match doc {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| serde_json::from_value(item).map_err(|e| invalid(format!("#{}", i + 1), e)))
            .collect(),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, item)| serde_json::from_value(item).map_err(|e| invalid(format!("'{}'", key), e)))
            .collect(),
        _ => Err(PipelineError::Activities {
            path: path.to_path_buf(),
            message: "expected a JSON array or object".to_string(),
        }),
    }
}
