//! `aidmap stats` - organisation reference coverage in IATI files

use miette::Result;
use std::path::PathBuf;

use crate::cli::args::{GlobalOpts, OutputFormat};
use crate::cli::helpers::{expand_inputs, plural, print_json, reporter};
use crate::pipeline::stats::FeedStats;

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// IATI activity JSON files, or directories to search for them
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

pub fn run(args: StatsArgs, global: &GlobalOpts) -> Result<()> {
    let reporter = reporter(global);
    let mut stats = FeedStats::new();
    for file in expand_inputs(&args.paths, "json")? {
        stats.add_file(&file, &reporter)?;
    }
    reporter.info(format!(
        "Counted organisations in {}",
        plural(stats.activities, "activity", "activities")
    ));

    match args.format {
        OutputFormat::Json => print_json(&stats),
        OutputFormat::Md => {
            println!("{}", stats.to_markdown());
            Ok(())
        }
    }
}
