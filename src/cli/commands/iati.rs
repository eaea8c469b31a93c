//! `aidmap iati` - build activities from IATI activity records

use miette::Result;
use std::path::PathBuf;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{context, expand_inputs, plural, print_json};
use crate::core::ReferenceContext;
use crate::entities::activity::Activity;
use crate::pipeline::iati::read_iati;

pub fn run(paths: &[PathBuf], global: &GlobalOpts) -> Result<()> {
    let mut ctx = context(global)?;
    let activities = build(&mut ctx, paths)?;
    print_json(&activities)
}

/// Read every IATI file under `paths`, in order
///
/// Records without sectors are dropped by the builder; see `--verbose` for
/// per-file counts.
pub fn build(ctx: &mut ReferenceContext, paths: &[PathBuf]) -> Result<Vec<Activity>> {
    let files = expand_inputs(paths, "json")?;
    let mut activities = Vec::new();
    for file in &files {
        activities.extend(read_iati(ctx, file)?);
    }
    ctx.reporter().info(format!(
        "Found {} IATI {} in {}",
        activities.len(),
        if activities.len() == 1 { "activity" } else { "activities" },
        plural(files.len(), "file", "files")
    ));
    Ok(activities)
}
