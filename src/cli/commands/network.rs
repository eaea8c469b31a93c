//! `aidmap network` - organisation network from an organisation index

use miette::Result;
use std::path::PathBuf;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{plural, print_json, reporter};
use crate::index::{build_network, OrgIndex};
use crate::json::read_document;

#[derive(clap::Args, Debug)]
pub struct NetworkArgs {
    /// Organisation index JSON written by `aidmap index orgs`
    pub org_index: PathBuf,
}

pub fn run(args: NetworkArgs, global: &GlobalOpts) -> Result<()> {
    let index: OrgIndex = read_document(&args.org_index)?;
    let network = build_network(&index);
    reporter(global).info(format!(
        "Network has {} and {}",
        plural(network.nodes.len(), "node", "nodes"),
        plural(network.links.len(), "link", "links")
    ));
    print_json(&network)
}
