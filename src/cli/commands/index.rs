//! `aidmap index` - aggregation indexes over activity files

use clap::Subcommand;
use miette::Result;
use std::path::PathBuf;

use crate::cli::args::GlobalOpts;
use crate::cli::commands::merge::load_catalog;
use crate::cli::helpers::{context, plural, print_json};
use crate::index::{build_location_index, build_org_index, build_sector_index};

#[derive(Subcommand, Debug)]
pub enum IndexCommands {
    /// Organisation index: roles, partners, sectors and locations per organisation
    Orgs {
        /// Activity JSON files (merged first, first identifier wins)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Sector index: organisations and locations per sector
    Sectors {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Location index: organisations and sectors per location
    Locations {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

pub fn run(cmd: IndexCommands, global: &GlobalOpts) -> Result<()> {
    let mut ctx = context(global)?;
    match cmd {
        IndexCommands::Orgs { paths } => {
            let catalog = load_catalog(&mut ctx, &paths)?;
            let index = build_org_index(&mut ctx, catalog.values())?;
            ctx.reporter()
                .info(format!("Indexed {}", plural(index.len(), "organisation", "organisations")));
            print_json(&index)
        }
        IndexCommands::Sectors { paths } => {
            let catalog = load_catalog(&mut ctx, &paths)?;
            let index = build_sector_index(&mut ctx, catalog.values())?;
            ctx.reporter().info(format!(
                "Indexed {} and {}",
                plural(index.humanitarian.len(), "cluster", "clusters"),
                plural(index.dac.len(), "DAC sector", "DAC sectors")
            ));
            print_json(&index)
        }
        IndexCommands::Locations { paths } => {
            let catalog = load_catalog(&mut ctx, &paths)?;
            let index = build_location_index(&mut ctx, catalog.values())?;
            ctx.reporter().info(format!(
                "Indexed {}, {} and {}",
                plural(index.admin1.len(), "region", "regions"),
                plural(index.admin2.len(), "district", "districts"),
                plural(index.unclassified.len(), "unclassified location", "unclassified locations")
            ));
            print_json(&index)
        }
    }
}
