//! Sector index: who works in each sector, and where

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Faceted, LevelTally, ResolvedActivity, ScopeTally, SourceTally};
use crate::core::context::ReferenceContext;
use crate::core::reference::ReferenceError;
use crate::entities::activity::{Activity, OrderedSet};
use crate::entities::sector::{Sector, SectorType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorIndexEntry {
    pub info: Sector,

    #[serde(default)]
    pub activities: OrderedSet,

    #[serde(default)]
    pub sources: SourceTally,

    #[serde(default)]
    pub orgs: Faceted<ScopeTally>,

    #[serde(default)]
    pub locations: Faceted<LevelTally>,
}

impl SectorIndexEntry {
    pub fn new(info: Sector) -> Self {
        Self {
            info,
            activities: OrderedSet::new(),
            sources: SourceTally::new(),
            orgs: Faceted::default(),
            locations: Faceted::default(),
        }
    }
}

/// Sector index, by sector type then stub
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorIndex {
    #[serde(default)]
    pub humanitarian: BTreeMap<String, SectorIndexEntry>,
    #[serde(default)]
    pub dac: BTreeMap<String, SectorIndexEntry>,
}

impl SectorIndex {
    pub fn get(&self, sector_type: SectorType) -> &BTreeMap<String, SectorIndexEntry> {
        match sector_type {
            SectorType::Dac => &self.dac,
            SectorType::Humanitarian => &self.humanitarian,
        }
    }

    fn entry(&mut self, sector: &Sector) -> &mut SectorIndexEntry {
        let entries = match sector.sector_type {
            SectorType::Dac => &mut self.dac,
            SectorType::Humanitarian => &mut self.humanitarian,
        };
        entries
            .entry(sector.stub.clone())
            .or_insert_with(|| SectorIndexEntry::new(sector.clone()))
    }

    pub fn add(&mut self, resolved: &ResolvedActivity<'_>) {
        let source = resolved.source();
        for sector in &resolved.sectors {
            let entry = self.entry(sector);
            if !entry.activities.insert(resolved.identifier()) {
                continue;
            }
            *entry.sources.entry(source).or_insert(0) += 1;
            for (org, _) in &resolved.orgs {
                entry.orgs.record(source, |tally| tally.add(org));
            }
            for location in &resolved.locations {
                entry.locations.record(source, |tally| tally.add(location));
            }
        }
    }
}

pub fn build_sector_index<'a>(
    ctx: &mut ReferenceContext,
    activities: impl IntoIterator<Item = &'a Activity>,
) -> Result<SectorIndex, ReferenceError> {
    let mut index = SectorIndex::default();
    for activity in activities {
        let resolved = ResolvedActivity::resolve(ctx, activity)?;
        index.add(&resolved);
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::activity::Source;
    use crate::index::tests::context;

    #[test]
    fn test_sector_entries() {
        let mut ctx = context();
        let mut a = Activity::new("a1", Source::ThreeW);
        a.orgs.implementing.insert("sydn");
        a.orgs.funding.insert("sydn");
        a.sectors.humanitarian.insert("health");
        a.locations.admin1.insert("bay");
        let mut b = Activity::new("a2", Source::Iati);
        b.orgs.implementing.insert("wfp");
        b.sectors.humanitarian.insert("Health");
        b.sectors.dac.insert("12220");
        b.sectors.dac.insert("Cash Transfers");

        let index = build_sector_index(&mut ctx, [&a, &b]).unwrap();
        let health = &index.humanitarian["health"];
        assert_eq!(health.activities.as_slice(), &["a1".to_string(), "a2".to_string()]);
        assert_eq!(health.orgs.all.local["sydn"], 1);
        assert_eq!(health.orgs.threew.local["sydn"], 1);
        assert_eq!(health.orgs.iati.international["wfp"], 1);
        assert_eq!(health.locations.all.admin1["bay"], 1);
        assert!(health.locations.iati.admin1.is_empty());
        assert_eq!(health.sources[&Source::Iati], 1);

        assert_eq!(index.dac["12220"].info.name, "Basic health care");
        let cash = &index.dac["cash transfers"];
        assert!(cash.info.unrecognised);
        assert!(index.humanitarian.get("wash").is_none());
    }

    #[test]
    fn test_json_layout() {
        let mut ctx = context();
        let mut a = Activity::new("a1", Source::ThreeW);
        a.sectors.humanitarian.insert("wash");
        let index = build_sector_index(&mut ctx, [&a]).unwrap();
        let value = serde_json::to_value(&index).unwrap();
        assert_eq!(value["humanitarian"]["wash"]["info"]["type"], "humanitarian");
        assert!(value["dac"].as_object().unwrap().is_empty());
        assert!(value["humanitarian"]["wash"]["orgs"]["3w"]["unknown"].is_object());
    }
}
