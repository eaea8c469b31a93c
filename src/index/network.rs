//! Organisation co-occurrence network for visualisation

use serde::{Deserialize, Serialize};

use super::org::OrgIndex;
use crate::entities::activity::Source;
use crate::entities::organisation::Scope;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSectors {
    pub humanitarian: Vec<String>,
    pub dac: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub shortname: String,
    /// Scope group: unknown 0, local 1, regional 2, international 3
    pub group: u8,
    pub scope: Scope,
    pub humanitarian: bool,
    pub sources: Vec<Source>,
    pub sectors: NodeSectors,
    pub admin1: Vec<String>,
}

/// An unordered partnership; `source` always sorts before `target`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub value: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

/// Derive nodes and links from the organisation index
///
/// Skip-flagged organisations produce neither nodes nor links. Each pair is
/// emitted once, from the smaller stub to the larger.
pub fn build_network(index: &OrgIndex) -> Network {
    let mut network = Network::default();

    for (stub, entry) in index.iter() {
        if entry.info.skip {
            continue;
        }

        network.nodes.push(Node {
            id: stub.clone(),
            name: entry.info.name.clone(),
            shortname: entry.info.shortname.clone(),
            group: entry.info.scope.group(),
            scope: entry.info.scope,
            humanitarian: entry.humanitarian,
            sources: entry.sources.keys().copied().collect(),
            sectors: NodeSectors {
                humanitarian: entry.sectors.humanitarian.keys().cloned().collect(),
                dac: entry.sectors.dac.keys().cloned().collect(),
            },
            admin1: entry.locations.admin1.keys().cloned().collect(),
        });

        for (partner, count) in entry.partners.all.iter() {
            if partner <= stub {
                continue;
            }
            match index.get(partner) {
                Some(other) if !other.info.skip => network.links.push(Link {
                    source: stub.clone(),
                    target: partner.clone(),
                    value: *count,
                }),
                _ => continue,
            }
        }
    }

    network.links.sort();
    network
}
