//! `aidmap merge` - merge activity files into one catalog
//!
//! Files are merged in the order given and the first activity with a given
//! identifier wins.

use miette::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{context, expand_inputs, plural, print_json};
use crate::core::ReferenceContext;
use crate::entities::activity::Activity;
use crate::pipeline::merge::Merger;
use crate::pipeline::read_activities;

pub fn run(paths: &[PathBuf], global: &GlobalOpts) -> Result<()> {
    let mut ctx = context(global)?;
    let catalog = load_catalog(&mut ctx, paths)?;
    print_json(&catalog)
}

/// Read and merge activity files in order
pub fn load_catalog(ctx: &mut ReferenceContext, paths: &[PathBuf]) -> Result<BTreeMap<String, Activity>> {
    let files = expand_inputs(paths, "json")?;
    let mut merger = Merger::new();
    for file in &files {
        merger.extend(ctx, read_activities(file)?)?;
    }
    Ok(finish(ctx, merger))
}

/// Report the merge summary and hand back the catalog
pub fn finish(ctx: &ReferenceContext, merger: Merger) -> BTreeMap<String, Activity> {
    let reporter = ctx.reporter();
    if merger.duplicates() > 0 {
        reporter.warn(format!(
            "{} ignored (first occurrence kept)",
            plural(merger.duplicates(), "duplicate activity", "duplicate activities")
        ));
    }
    reporter.info(format!(
        "Merged {}",
        plural(merger.len(), "activity", "activities")
    ));
    merger.finish()
}
