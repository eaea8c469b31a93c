//! Merge activity sets into one catalog keyed by identifier
//!
//! The first activity seen with a given identifier wins, so input order
//! matters: pass the preferred source first. Every reference is rewritten to
//! its canonical stub on the way in, including names the builders deferred
//! because they were unrecognised at the time.

use std::collections::BTreeMap;

use crate::core::context::ReferenceContext;
use crate::core::reference::ReferenceError;
use crate::entities::activity::{Activity, OrderedSet, Role};
use crate::entities::location::Level;
use crate::entities::sector::SectorType;

/// Accumulates activities, first occurrence wins
#[derive(Debug, Default)]
pub struct Merger {
    catalog: BTreeMap<String, Activity>,
    duplicates: usize,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one activity; returns false if its identifier was already present
    pub fn add(&mut self, ctx: &mut ReferenceContext, activity: Activity) -> Result<bool, ReferenceError> {
        if self.catalog.contains_key(&activity.identifier) {
            self.duplicates += 1;
            ctx.reporter().detail(format!(
                "Duplicate activity {} ({}) ignored",
                activity.identifier, activity.source
            ));
            return Ok(false);
        }
        let activity = canonicalise(ctx, activity)?;
        self.catalog.insert(activity.identifier.clone(), activity);
        Ok(true)
    }

    /// Add a batch of activities in order
    pub fn extend(
        &mut self,
        ctx: &mut ReferenceContext,
        activities: impl IntoIterator<Item = Activity>,
    ) -> Result<(), ReferenceError> {
        for activity in activities {
            self.add(ctx, activity)?;
        }
        Ok(())
    }

    /// Number of activities discarded as duplicates
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// The merged catalog, ordered by identifier
    pub fn finish(self) -> BTreeMap<String, Activity> {
        self.catalog
    }
}

/// Rewrite every entity reference in an activity to its canonical stub
///
/// Skip-flagged entities are removed.
pub fn canonicalise(ctx: &mut ReferenceContext, mut activity: Activity) -> Result<Activity, ReferenceError> {
    for role in Role::ALL {
        let mut stubs = OrderedSet::new();
        for reference in activity.orgs.get(role) {
            if let Some(org) = ctx.canonical_org(reference)? {
                if !org.skip {
                    stubs.insert(org.stub);
                }
            }
        }
        *activity.orgs.get_mut(role) = stubs;
    }

    if let Some(reporter) = activity.reported_by.take() {
        activity.reported_by = ctx
            .canonical_org(&reporter)?
            .filter(|org| !org.skip)
            .map(|org| org.stub);
    }

    for sector_type in SectorType::ALL {
        let mut stubs = OrderedSet::new();
        for reference in activity.sectors.get(sector_type) {
            if let Some(sector) = ctx.canonical_sector(reference, sector_type)? {
                if !sector.skip {
                    stubs.insert(sector.stub);
                }
            }
        }
        *activity.sectors.get_mut(sector_type) = stubs;
    }

    for level in Level::ALL {
        let mut stubs = OrderedSet::new();
        for reference in activity.locations.get(level) {
            if let Some(location) = ctx.canonical_location(reference, level)? {
                if !location.skip {
                    stubs.insert(location.stub);
                }
            }
        }
        *activity.locations.get_mut(level) = stubs;
    }

    Ok(activity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::{build_location_table, build_org_table, build_sector_table};
    use crate::core::report::Reporter;
    use crate::entities::activity::Source;
    use serde_json::json;

    fn context() -> ReferenceContext {
        let orgs = build_org_table(&json!({
            "WFP": { "name": "World Food Programme", "shortname": "WFP", "scope": "international" },
            "Hidden": { "name": "Hidden Org", "skip": true }
        }))
        .unwrap();
        let locations = build_location_table(&json!({
            "admin1": { "Bay": { "name": "Bay" } },
            "unclassified": {}
        }))
        .unwrap();
        let clusters =
            build_sector_table(&json!({ "Health": { "name": "Health" } }), SectorType::Humanitarian).unwrap();
        let dac = build_sector_table(&json!({}), SectorType::Dac).unwrap();
        ReferenceContext::detached(Reporter::silent())
            .with_orgs(orgs)
            .with_locations(locations)
            .with_clusters(clusters)
            .with_dac(dac)
    }

    fn capital_context() -> ReferenceContext {
        let locations = build_location_table(&json!({
            "admin1": { "Banadir": { "name": "Banadir", "synonyms": ["Mogadishu"],
                "admin2": { "Mogadishu": { "name": "Mogadishu", "synonyms": ["Hamar"] } } } }
        }))
        .unwrap();
        ReferenceContext::detached(Reporter::silent()).with_locations(locations)
    }

    fn activity(id: &str, title: &str) -> Activity {
        let mut a = Activity::new(id, Source::ThreeW);
        a.title = Some(title.to_string());
        a
    }

    #[test]
    fn test_first_occurrence_wins() {
        let mut ctx = context();
        let mut merger = Merger::new();
        merger
            .extend(&mut ctx, vec![activity("a", "first"), activity("b", "other")])
            .unwrap();
        assert!(!merger.add(&mut ctx, activity("a", "second")).unwrap());
        assert_eq!(merger.duplicates(), 1);

        let catalog = merger.finish();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog["a"].title.as_deref(), Some("first"));
    }

    #[test]
    fn test_district_named_like_region_synonym_survives_merge() {
        let mut ctx = capital_context();
        let mut a = activity("a", "capital");
        a.locations = ctx.resolve_place(Some("Banadir"), Some("Hamar"), None).unwrap();
        assert!(a.locations.admin2.contains("banadir mogadishu"));

        let merged = canonicalise(&mut ctx, a).unwrap();
        assert_eq!(merged.locations.admin1.as_slice(), &["banadir".to_string()]);
        assert_eq!(merged.locations.admin2.as_slice(), &["banadir mogadishu".to_string()]);
    }

    #[test]
    fn test_catalog_ordered_by_identifier() {
        let mut ctx = context();
        let mut merger = Merger::new();
        merger
            .extend(&mut ctx, vec![activity("z", "z"), activity("m", "m"), activity("a", "a")])
            .unwrap();
        let ids: Vec<_> = merger.finish().into_keys().collect();
        assert_eq!(ids, vec!["a", "m", "z"]);
    }

    #[test]
    fn test_references_become_stubs() {
        let mut ctx = context();
        let mut a = activity("a", "t");
        a.orgs.implementing.insert("World Food Programme");
        a.orgs.implementing.insert("WFP");
        a.orgs.funding.insert("Brand New Donor");
        a.orgs.programming.insert("Hidden Org");
        a.reported_by = Some("Brand New Donor".into());
        a.sectors.humanitarian.insert("HEALTH");
        a.locations.admin1.insert("bay");
        a.locations.unclassified.insert("Tiny Hamlet");
        a.locations.countries.insert("SO");

        let a = canonicalise(&mut ctx, a).unwrap();
        assert_eq!(a.orgs.implementing.as_slice(), &["wfp".to_string()]);
        assert_eq!(a.orgs.funding.as_slice(), &["brand new donor".to_string()]);
        assert!(a.orgs.programming.is_empty());
        assert_eq!(a.reported_by.as_deref(), Some("brand new donor"));
        assert_eq!(a.sectors.humanitarian.as_slice(), &["health".to_string()]);
        assert_eq!(a.locations.admin1.as_slice(), &["bay".to_string()]);
        assert_eq!(a.locations.unclassified.as_slice(), &["tiny hamlet".to_string()]);
        assert_eq!(a.locations.countries.as_slice(), &["SO".to_string()]);
    }
}
