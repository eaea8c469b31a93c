//! Location index: who works in each place, and on what

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Faceted, ResolvedActivity, ScopeTally, SourceTally, TypeTally};
use crate::core::context::ReferenceContext;
use crate::core::reference::ReferenceError;
use crate::entities::activity::{Activity, OrderedSet};
use crate::entities::location::{Level, Location};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationIndexEntry {
    pub info: Location,

    #[serde(default)]
    pub activities: OrderedSet,

    #[serde(default)]
    pub sources: SourceTally,

    #[serde(default)]
    pub orgs: Faceted<ScopeTally>,

    #[serde(default)]
    pub sectors: Faceted<TypeTally>,
}

impl LocationIndexEntry {
    pub fn new(info: Location) -> Self {
        Self {
            info,
            activities: OrderedSet::new(),
            sources: SourceTally::new(),
            orgs: Faceted::default(),
            sectors: Faceted::default(),
        }
    }
}

/// Location index, by level then stub
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationIndex {
    #[serde(default)]
    pub admin1: BTreeMap<String, LocationIndexEntry>,
    #[serde(default)]
    pub admin2: BTreeMap<String, LocationIndexEntry>,
    #[serde(default)]
    pub unclassified: BTreeMap<String, LocationIndexEntry>,
}

impl LocationIndex {
    pub fn get(&self, level: Level) -> &BTreeMap<String, LocationIndexEntry> {
        match level {
            Level::Admin1 => &self.admin1,
            Level::Admin2 => &self.admin2,
            Level::Unclassified => &self.unclassified,
        }
    }

    fn entry(&mut self, location: &Location) -> &mut LocationIndexEntry {
        let entries = match location.level {
            Level::Admin1 => &mut self.admin1,
            Level::Admin2 => &mut self.admin2,
            Level::Unclassified => &mut self.unclassified,
        };
        entries
            .entry(location.stub.clone())
            .or_insert_with(|| LocationIndexEntry::new(location.clone()))
    }

    pub fn add(&mut self, resolved: &ResolvedActivity<'_>) {
        let source = resolved.source();
        for location in &resolved.locations {
            let entry = self.entry(location);
            if !entry.activities.insert(resolved.identifier()) {
                continue;
            }
            *entry.sources.entry(source).or_insert(0) += 1;
            for (org, _) in &resolved.orgs {
                entry.orgs.record(source, |tally| tally.add(org));
            }
            for sector in &resolved.sectors {
                entry.sectors.record(source, |tally| tally.add(sector));
            }
        }
    }
}

pub fn build_location_index<'a>(
    ctx: &mut ReferenceContext,
    activities: impl IntoIterator<Item = &'a Activity>,
) -> Result<LocationIndex, ReferenceError> {
    let mut index = LocationIndex::default();
    for activity in activities {
        let resolved = ResolvedActivity::resolve(ctx, activity)?;
        index.add(&resolved);
    }
    Ok(index)
}
