//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, index::IndexCommands, network::NetworkArgs, run::RunArgs,
    stats::StatsArgs,
};

#[derive(Parser)]
#[command(name = "aidmap")]
#[command(author, version, about = "Merge humanitarian activity feeds into canonical indexes")]
#[command(long_about = "Builds one catalog of aid activities from HXL-tagged 3W spreadsheets and IATI \
activity records, resolving every organisation, sector and location against reference tables, \
then derives organisation, sector and location indexes and an organisation network.\n\n\
Each stage writes one JSON document to stdout; diagnostics go to stderr.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Config file (default: ./aidmap.yaml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Suppress progress and summary output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Report per-record warnings (unrecognised names, conflicts, duplicates)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build activities from HXL-tagged 3W CSV files
    Threew {
        /// CSV files, or directories to search for them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Build activities from IATI activity JSON files
    Iati {
        /// JSON files, or directories to search for them
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Merge activity files into one catalog (first identifier wins)
    Merge {
        /// Activity JSON files in priority order
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Build an aggregation index from activity files
    #[command(subcommand)]
    Index(IndexCommands),

    /// Build the organisation network from an organisation index
    Network(NetworkArgs),

    /// Summarise organisation references in IATI files
    Stats(StatsArgs),

    /// Run every stage and write all outputs to a directory
    Run(RunArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON document
    #[default]
    Json,
    /// Markdown table
    Md,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["aidmap", "merge", "a.json", "b.json", "-v", "--config", "x.yaml"]).unwrap();
        assert!(cli.global.verbose);
        assert_eq!(cli.global.config, Some(PathBuf::from("x.yaml")));
        match cli.command {
            Commands::Merge { paths } => assert_eq!(paths.len(), 2),
            _ => panic!("expected merge"),
        }
    }

    #[test]
    fn test_paths_required() {
        assert!(Cli::try_parse_from(["aidmap", "threew"]).is_err());
        assert!(Cli::try_parse_from(["aidmap", "index", "orgs"]).is_err());
    }
}
