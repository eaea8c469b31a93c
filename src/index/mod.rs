//! Aggregation indexes over the merged activity catalog
//!
//! Every index entry is created with all of its tally buckets present (empty
//! maps, never missing keys). Within one activity each entity is counted at
//! most once, however many roles or columns mention it.

pub mod location;
pub mod network;
pub mod org;
pub mod sector;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::context::ReferenceContext;
use crate::core::reference::ReferenceError;
use crate::entities::activity::{Activity, Role, Source};
use crate::entities::location::{Level, Location};
use crate::entities::organisation::{Organisation, Scope};
use crate::entities::sector::{Sector, SectorType};

pub use location::{build_location_index, LocationIndex};
pub use network::{build_network, Network};
pub use org::{build_org_index, OrgIndex};
pub use sector::{build_sector_index, SectorIndex};

/// Occurrence counts keyed by entity stub
pub type Counts = BTreeMap<String, u64>;

fn bump(counts: &mut Counts, stub: &str) {
    *counts.entry(stub.to_string()).or_insert(0) += 1;
}

/// Organisation counts bucketed by scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeTally {
    #[serde(default)]
    pub local: Counts,
    #[serde(default)]
    pub regional: Counts,
    #[serde(default)]
    pub international: Counts,
    #[serde(default)]
    pub unknown: Counts,
}

impl ScopeTally {
    pub fn get(&self, scope: Scope) -> &Counts {
        match scope {
            Scope::Local => &self.local,
            Scope::Regional => &self.regional,
            Scope::International => &self.international,
            Scope::Unknown => &self.unknown,
        }
    }

    pub fn add(&mut self, org: &Organisation) {
        let counts = match org.scope {
            Scope::Local => &mut self.local,
            Scope::Regional => &mut self.regional,
            Scope::International => &mut self.international,
            Scope::Unknown => &mut self.unknown,
        };
        bump(counts, &org.stub);
    }

    /// Every (stub, count) across all scopes
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        Scope::ALL.into_iter().flat_map(move |s| self.get(s).iter())
    }
}

/// Sector counts bucketed by sector type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeTally {
    #[serde(default)]
    pub humanitarian: Counts,
    #[serde(default)]
    pub dac: Counts,
}

impl TypeTally {
    pub fn get(&self, sector_type: SectorType) -> &Counts {
        match sector_type {
            SectorType::Dac => &self.dac,
            SectorType::Humanitarian => &self.humanitarian,
        }
    }

    pub fn add(&mut self, sector: &Sector) {
        let counts = match sector.sector_type {
            SectorType::Dac => &mut self.dac,
            SectorType::Humanitarian => &mut self.humanitarian,
        };
        bump(counts, &sector.stub);
    }
}

/// Location counts bucketed by administrative level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelTally {
    #[serde(default)]
    pub admin1: Counts,
    #[serde(default)]
    pub admin2: Counts,
    #[serde(default)]
    pub unclassified: Counts,
}

impl LevelTally {
    pub fn get(&self, level: Level) -> &Counts {
        match level {
            Level::Admin1 => &self.admin1,
            Level::Admin2 => &self.admin2,
            Level::Unclassified => &self.unclassified,
        }
    }

    pub fn add(&mut self, location: &Location) {
        let counts = match location.level {
            Level::Admin1 => &mut self.admin1,
            Level::Admin2 => &mut self.admin2,
            Level::Unclassified => &mut self.unclassified,
        };
        bump(counts, &location.stub);
    }
}

/// A tally kept overall and per source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Faceted<T> {
    #[serde(default)]
    pub all: T,
    #[serde(default, rename = "3w")]
    pub threew: T,
    #[serde(default)]
    pub iati: T,
}

impl<T> Faceted<T> {
    pub fn source(&self, source: Source) -> &T {
        match source {
            Source::ThreeW => &self.threew,
            Source::Iati => &self.iati,
        }
    }

    /// Apply an update to the overall facet and to the activity's source facet
    pub fn record(&mut self, source: Source, mut update: impl FnMut(&mut T)) {
        update(&mut self.all);
        match source {
            Source::ThreeW => update(&mut self.threew),
            Source::Iati => update(&mut self.iati),
        }
    }
}

/// Activities per source tag
pub type SourceTally = BTreeMap<Source, u64>;

/// One activity with every reference resolved to a canonical record
///
/// Skip-flagged entities are dropped and each entity appears once.
pub struct ResolvedActivity<'a> {
    pub activity: &'a Activity,
    /// Organisations named in a role, with every role they hold
    pub orgs: Vec<(Organisation, Vec<Role>)>,
    pub reporter: Option<Organisation>,
    pub sectors: Vec<Sector>,
    pub locations: Vec<Location>,
}

impl<'a> ResolvedActivity<'a> {
    pub fn resolve(ctx: &mut ReferenceContext, activity: &'a Activity) -> Result<Self, ReferenceError> {
        let mut orgs: Vec<(Organisation, Vec<Role>)> = Vec::new();
        for (role, reference) in activity.orgs.iter() {
            let Some(org) = ctx.canonical_org(reference)?.filter(|o| !o.skip) else {
                continue;
            };
            match orgs.iter_mut().find(|(o, _)| o.stub == org.stub) {
                Some((_, roles)) => {
                    if !roles.contains(&role) {
                        roles.push(role);
                    }
                }
                None => orgs.push((org, vec![role])),
            }
        }

        let reporter = match activity.reported_by.as_deref() {
            Some(reference) => ctx.canonical_org(reference)?.filter(|o| !o.skip),
            None => None,
        };

        let mut sectors: Vec<Sector> = Vec::new();
        for (sector_type, reference) in activity.sectors.iter() {
            if let Some(sector) = ctx.canonical_sector(reference, sector_type)? {
                let seen = sectors
                    .iter()
                    .any(|s| s.sector_type == sector.sector_type && s.stub == sector.stub);
                if !sector.skip && !seen {
                    sectors.push(sector);
                }
            }
        }

        let mut locations: Vec<Location> = Vec::new();
        for (level, reference) in activity.locations.iter() {
            if let Some(location) = ctx.canonical_location(reference, level)? {
                let seen = locations
                    .iter()
                    .any(|l| l.level == location.level && l.stub == location.stub);
                if !location.skip && !seen {
                    locations.push(location);
                }
            }
        }

        Ok(Self {
            activity,
            orgs,
            reporter,
            sectors,
            locations,
        })
    }

    /// Organisations holding a role, then the reporter if it holds none
    pub fn participants(&self) -> Vec<&Organisation> {
        let mut all: Vec<&Organisation> = self.orgs.iter().map(|(o, _)| o).collect();
        if let Some(ref reporter) = self.reporter {
            if !all.iter().any(|o| o.stub == reporter.stub) {
                all.push(reporter);
            }
        }
        all
    }

    pub fn source(&self) -> Source {
        self.activity.source
    }

    pub fn identifier(&self) -> &str {
        &self.activity.identifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::{build_location_table, build_org_table, build_sector_table};
    use crate::core::report::Reporter;
    use serde_json::json;

    pub(crate) fn context() -> ReferenceContext {
        let orgs = build_org_table(&json!({
            "WFP": { "name": "World Food Programme", "shortname": "WFP", "scope": "international" },
            "SYDN": { "name": "Somali Youth Development Network", "shortname": "SYDN", "scope": "local" },
            "IGAD": { "name": "IGAD", "scope": "regional" },
            "Hidden": { "name": "Hidden Org", "skip": true }
        }))
        .unwrap();
        let locations = build_location_table(&json!({
            "admin1": { "Bay": { "name": "Bay", "admin2": { "Baidoa": { "name": "Baidoa" } } } },
            "unclassified": {}
        }))
        .unwrap();
        let clusters = build_sector_table(
            &json!({ "Health": { "name": "Health" }, "WASH": { "name": "WASH" } }),
            SectorType::Humanitarian,
        )
        .unwrap();
        let dac = build_sector_table(&json!({ "12220": { "name": "Basic health care" } }), SectorType::Dac)
            .unwrap();
        ReferenceContext::detached(Reporter::silent())
            .with_orgs(orgs)
            .with_locations(locations)
            .with_clusters(clusters)
            .with_dac(dac)
    }

    #[test]
    fn test_resolved_activity_dedups_across_roles() {
        let mut ctx = context();
        let mut activity = Activity::new("a", Source::ThreeW);
        activity.orgs.implementing.insert("wfp");
        activity.orgs.funding.insert("World Food Programme");
        activity.orgs.programming.insert("hidden");
        activity.reported_by = Some("sydn".into());
        activity.sectors.humanitarian.insert("health");
        activity.sectors.humanitarian.insert("HEALTH");
        activity.locations.admin1.insert("bay");

        let resolved = ResolvedActivity::resolve(&mut ctx, &activity).unwrap();
        assert_eq!(resolved.orgs.len(), 1);
        assert_eq!(resolved.orgs[0].1, vec![Role::Implementing, Role::Funding]);
        assert_eq!(resolved.sectors.len(), 1);
        let stubs: Vec<_> = resolved.participants().iter().map(|o| o.stub.clone()).collect();
        assert_eq!(stubs, vec!["wfp", "sydn"]);
    }

    #[test]
    fn test_faceted_record() {
        let mut tally: Faceted<Counts> = Faceted::default();
        tally.record(Source::Iati, |c| bump(c, "x"));
        tally.record(Source::ThreeW, |c| bump(c, "x"));
        assert_eq!(tally.all["x"], 2);
        assert_eq!(tally.source(Source::Iati)["x"], 1);
        let value = serde_json::to_value(&tally).unwrap();
        assert_eq!(value["3w"]["x"], 1);
    }

    #[test]
    fn test_empty_tallies_serialize_every_bucket() {
        let value = serde_json::to_value(Faceted::<ScopeTally>::default()).unwrap();
        for facet in ["all", "3w", "iati"] {
            for scope in ["local", "regional", "international", "unknown"] {
                assert!(value[facet][scope].as_object().unwrap().is_empty());
            }
        }
    }
}
