//! `aidmap threew` - build activities from 3W spreadsheets

use miette::Result;
use std::path::PathBuf;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{context, expand_inputs, plural, print_json};
use crate::core::ReferenceContext;
use crate::entities::activity::Activity;
use crate::pipeline::threew::read_threew;

pub fn run(paths: &[PathBuf], global: &GlobalOpts) -> Result<()> {
    let mut ctx = context(global)?;
    let activities = build(&mut ctx, paths)?;
    print_json(&activities)
}

/// Read every 3W file under `paths`, in order
pub fn build(ctx: &mut ReferenceContext, paths: &[PathBuf]) -> Result<Vec<Activity>> {
    let files = expand_inputs(paths, "csv")?;
    let mut activities = Vec::new();
    for file in &files {
        activities.extend(read_threew(ctx, file)?);
    }
    ctx.reporter().info(format!(
        "Found {} 3W {} in {}",
        activities.len(),
        if activities.len() == 1 { "activity" } else { "activities" },
        plural(files.len(), "file", "files")
    ));
    Ok(activities)
}
