//! Organisation index
//!
//! For every organisation: what it did (activities by role), where, in
//! which sectors, and with whom. Partnerships are symmetric and counted once
//! per shared activity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Faceted, LevelTally, ResolvedActivity, ScopeTally, SourceTally, TypeTally};
use crate::core::context::ReferenceContext;
use crate::core::reference::ReferenceError;
use crate::entities::activity::{Activity, OrderedSet, Role};
use crate::entities::organisation::Organisation;

/// Activity identifiers by role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleActivities {
    #[serde(default)]
    pub implementing: OrderedSet,
    #[serde(default)]
    pub programming: OrderedSet,
    #[serde(default)]
    pub funding: OrderedSet,
}

impl RoleActivities {
    pub fn get(&self, role: Role) -> &OrderedSet {
        match role {
            Role::Implementing => &self.implementing,
            Role::Programming => &self.programming,
            Role::Funding => &self.funding,
        }
    }

    fn get_mut(&mut self, role: Role) -> &mut OrderedSet {
        match role {
            Role::Implementing => &mut self.implementing,
            Role::Programming => &mut self.programming,
            Role::Funding => &mut self.funding,
        }
    }
}

/// Index entry for one organisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgIndexEntry {
    pub info: Organisation,

    #[serde(default)]
    pub sources: SourceTally,

    #[serde(default)]
    pub humanitarian: bool,

    #[serde(default)]
    pub activities: RoleActivities,

    /// Distinct activities the organisation holds any role in
    #[serde(default)]
    pub total_activities: u64,

    #[serde(default)]
    pub partners: Faceted<ScopeTally>,

    #[serde(default)]
    pub sectors: TypeTally,

    #[serde(default)]
    pub locations: LevelTally,
}

impl OrgIndexEntry {
    pub fn new(info: Organisation) -> Self {
        Self {
            info,
            sources: SourceTally::new(),
            humanitarian: false,
            activities: RoleActivities::default(),
            total_activities: 0,
            partners: Faceted::default(),
            sectors: TypeTally::default(),
            locations: LevelTally::default(),
        }
    }
}

/// Organisation index keyed by stub
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgIndex(pub BTreeMap<String, OrgIndexEntry>);

impl OrgIndex {
    pub fn get(&self, stub: &str) -> Option<&OrgIndexEntry> {
        self.0.get(stub)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OrgIndexEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn entry(&mut self, org: &Organisation) -> &mut OrgIndexEntry {
        self.0
            .entry(org.stub.clone())
            .or_insert_with(|| OrgIndexEntry::new(org.clone()))
    }

    /// Fold one activity into the index
    pub fn add(&mut self, resolved: &ResolvedActivity<'_>) {
        let source = resolved.source();
        let activity = resolved.activity;

        // The reporter always gets an entry, even without a role
        if let Some(ref reporter) = resolved.reporter {
            self.entry(reporter);
        }

        for (org, roles) in &resolved.orgs {
            let entry = self.entry(org);
            entry.humanitarian |= activity.humanitarian;
            *entry.sources.entry(source).or_insert(0) += 1;
            entry.total_activities += 1;
            for role in roles {
                entry.activities.get_mut(*role).insert(activity.identifier.clone());
            }
            for sector in &resolved.sectors {
                entry.sectors.add(sector);
            }
            for location in &resolved.locations {
                entry.locations.add(location);
            }
        }

        let participants = resolved.participants();
        for org in &participants {
            for partner in &participants {
                if org.stub == partner.stub {
                    continue;
                }
                self.entry(org).partners.record(source, |tally| tally.add(partner));
            }
        }
    }
}

/// Build the organisation index from a set of activities
pub fn build_org_index<'a>(
    ctx: &mut ReferenceContext,
    activities: impl IntoIterator<Item = &'a Activity>,
) -> Result<OrgIndex, ReferenceError> {
    let mut index = OrgIndex::default();
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

    fn activity(id: &str, source: Source, implementing: &[&str], funding: &[&str]) -> Activity {
        let mut a = Activity::new(id, source);
        for org in implementing {
            a.orgs.implementing.insert(*org);
        }
        for org in funding {
            a.orgs.funding.insert(*org);
        }
        a
    }

    #[test]
    fn test_entry_tallies() {
        let mut ctx = context();
        let mut a = activity("a1", Source::ThreeW, &["sydn"], &["wfp"]);
        a.humanitarian = true;
        a.sectors.humanitarian.insert("health");
        a.locations.admin2.insert("baidoa");
        a.locations.admin1.insert("bay");
        let b = activity("a2", Source::Iati, &["sydn", "wfp"], &[]);

        let index = build_org_index(&mut ctx, [&a, &b]).unwrap();
        let sydn = index.get("sydn").unwrap();
        assert_eq!(sydn.total_activities, 2);
        assert!(sydn.humanitarian);
        assert_eq!(sydn.activities.implementing.as_slice(), &["a1".to_string(), "a2".to_string()]);
        assert_eq!(sydn.sources[&Source::ThreeW], 1);
        assert_eq!(sydn.sources[&Source::Iati], 1);
        assert_eq!(sydn.sectors.humanitarian["health"], 1);
        assert_eq!(sydn.locations.admin2["baidoa"], 1);
        assert_eq!(sydn.partners.all.international["wfp"], 2);
        assert_eq!(sydn.partners.threew.international["wfp"], 1);
        assert_eq!(sydn.partners.iati.international["wfp"], 1);

        let wfp = index.get("wfp").unwrap();
        assert_eq!(wfp.partners.all.local["sydn"], 2);
        assert_eq!(wfp.activities.funding.as_slice(), &["a1".to_string()]);
        assert_eq!(wfp.activities.implementing.as_slice(), &["a2".to_string()]);
    }

    #[test]
    fn test_multiple_roles_counted_once() {
        let mut ctx = context();
        let mut a = activity("a1", Source::Iati, &["wfp"], &["wfp", "igad"]);
        a.sectors.dac.insert("12220");
        let index = build_org_index(&mut ctx, [&a]).unwrap();
        let wfp = index.get("wfp").unwrap();
        assert_eq!(wfp.total_activities, 1);
        assert_eq!(wfp.sectors.dac["12220"], 1);
        assert_eq!(wfp.partners.all.regional["igad"], 1);
        assert!(wfp.partners.all.get(crate::entities::organisation::Scope::International).is_empty());
    }

    #[test]
    fn test_reporter_gets_entry_and_partners() {
        let mut ctx = context();
        let mut a = activity("a1", Source::Iati, &["sydn"], &[]);
        a.reported_by = Some("wfp".into());
        let index = build_org_index(&mut ctx, [&a]).unwrap();
        let wfp = index.get("wfp").unwrap();
        assert_eq!(wfp.total_activities, 0);
        assert_eq!(wfp.partners.all.local["sydn"], 1);
        assert_eq!(index.get("sydn").unwrap().partners.all.international["wfp"], 1);
    }

    #[test]
    fn test_skipped_and_unrecognised_orgs() {
        let mut ctx = context();
        let a = activity("a1", Source::ThreeW, &["Hidden Org", "Brand New NGO"], &[]);
        let index = build_org_index(&mut ctx, [&a]).unwrap();
        assert!(index.get("hidden").is_none());
        let new = index.get("brand new ngo").unwrap();
        assert!(new.info.unrecognised);
        assert!(new.partners.all.unknown.is_empty());
    }

    #[test]
    fn test_deterministic_output() {
        let activities = vec![
            activity("a1", Source::ThreeW, &["sydn", "igad"], &["wfp"]),
            activity("a2", Source::Iati, &["Brand New NGO"], &["wfp"]),
        ];
        let first = serde_json::to_string_pretty(&build_org_index(&mut context(), &activities).unwrap()).unwrap();
        let second = serde_json::to_string_pretty(&build_org_index(&mut context(), &activities).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
