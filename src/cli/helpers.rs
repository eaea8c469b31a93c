//! Shared helper functions for CLI commands
//!
//! Input expansion, context setup and stdout output used by every stage.

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cli::args::GlobalOpts;
use crate::core::{Config, ReferenceContext, Reporter};
use crate::json::write_pretty;

/// Build the stderr reporter from the global flags
pub fn reporter(global: &GlobalOpts) -> Reporter {
    Reporter::new(global.quiet, global.verbose)
}

/// Load configuration and create the reference context for one run
pub fn context(global: &GlobalOpts) -> Result<ReferenceContext> {
    let config = Config::load(global.config.as_deref())?;
    Ok(ReferenceContext::new(&config, reporter(global))?)
}

/// Expand directories into the files beneath them with the given extension
///
/// Files named directly are kept whatever their extension. Directory
/// contents are returned in sorted order so runs are reproducible.
pub fn expand_inputs(paths: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.into_diagnostic()?;
            if entry.file_type().is_file() && has_extension(entry.path(), extension) {
                found.push(entry.into_path());
            }
        }
        if found.is_empty() {
            return Err(miette::miette!(
                "no .{} files found under {}",
                extension,
                path.display()
            ));
        }
        files.extend(found);
    }
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Write a JSON document to stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    write_pretty(stdout.lock(), value).into_diagnostic()
}

/// Write a JSON document to a file, creating or truncating it
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| miette::miette!("cannot create {}: {}", path.display(), e))?;
    write_pretty(BufWriter::new(file), value).into_diagnostic()
}

/// "1 activity" / "3 activities"
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}
