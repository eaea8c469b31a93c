//! `aidmap run` - the whole pipeline in one process
//!
//! Builds 3W then IATI activities, merges them (3W first, so a spreadsheet
//! activity wins over a feed record with the same identifier), and writes
//! the catalog, the three indexes and the network into one directory.

use clap::ArgGroup;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::args::GlobalOpts;
use crate::cli::commands::{iati, merge, threew};
use crate::cli::helpers::{context, write_json_file};
use crate::index::{build_location_index, build_network, build_org_index, build_sector_index};
use crate::pipeline::merge::Merger;

pub const ACTIVITIES_FILE: &str = "activities.json";
pub const ORG_INDEX_FILE: &str = "org-index.json";
pub const SECTOR_INDEX_FILE: &str = "sector-index.json";
pub const LOCATION_INDEX_FILE: &str = "location-index.json";
pub const NETWORK_FILE: &str = "network.json";

#[derive(clap::Args, Debug)]
#[command(group(ArgGroup::new("sources").required(true).multiple(true).args(["threew", "iati"])))]
pub struct RunArgs {
    /// 3W CSV files or directories
    #[arg(long, num_args = 1..)]
    pub threew: Vec<PathBuf>,

    /// IATI activity JSON files or directories
    #[arg(long, num_args = 1..)]
    pub iati: Vec<PathBuf>,

    /// Output directory (created if missing)
    #[arg(long, short = 'o')]
    pub out: PathBuf,
}

pub fn run(args: RunArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = context(global)?;

    let mut activities = Vec::new();
    if !args.threew.is_empty() {
        activities.extend(threew::build(&mut ctx, &args.threew)?);
    }
    if !args.iati.is_empty() {
        activities.extend(iati::build(&mut ctx, &args.iati)?);
    }

    let mut merger = Merger::new();
    merger.extend(&mut ctx, activities)?;
    let catalog = merge::finish(&ctx, merger);

    let orgs = build_org_index(&mut ctx, catalog.values())?;
    let sectors = build_sector_index(&mut ctx, catalog.values())?;
    let locations = build_location_index(&mut ctx, catalog.values())?;
    let network = build_network(&orgs);

    fs::create_dir_all(&args.out).into_diagnostic()?;
    write_json_file(&args.out.join(ACTIVITIES_FILE), &catalog)?;
    write_json_file(&args.out.join(ORG_INDEX_FILE), &orgs)?;
    write_json_file(&args.out.join(SECTOR_INDEX_FILE), &sectors)?;
    write_json_file(&args.out.join(LOCATION_INDEX_FILE), &locations)?;
    write_json_file(&args.out.join(NETWORK_FILE), &network)?;

    ctx.reporter().info(format!(
        "Wrote {} organisations, {} links to {}",
        orgs.len(),
        network.links.len(),
        args.out.display()
    ));
    Ok(())
}
