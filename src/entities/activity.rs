//! Activity record - the unit of work ingested from either source
//!
//! Activities have a fixed schema: every facet map is always present, and
//! every list is an [`OrderedSet`] so that a reference is never recorded twice.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::entities::location::Level;
use crate::entities::sector::SectorType;

/// Provenance of an activity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Source {
    /// Spreadsheet-style "who does what where" survey
    #[serde(rename = "3W")]
    ThreeW,
    /// Aid-transparency feed
    #[serde(rename = "IATI")]
    Iati,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::ThreeW, Source::Iati];

    /// Provenance tag as written in activity records
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::ThreeW => "3W",
            Source::Iati => "IATI",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role an organisation plays in an activity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Implementing,
    Programming,
    Funding,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Implementing, Role::Programming, Role::Funding];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Implementing => "implementing",
            Role::Programming => "programming",
            Role::Funding => "funding",
        }
    }
}

/// Beneficiary category for targeted counts
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Beneficiary {
    TotalIndividuals,
    TotalHouseholds,
    Women,
    Men,
    Girls,
    Boys,
}

/// Insertion-ordered list of non-empty strings without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OrderedSet(Vec<String>);

impl OrderedSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a value unless it is blank or already present
    ///
    /// Returns true if the value was added.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.trim().is_empty() || self.0.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl FromIterator<String> for OrderedSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<'a> IntoIterator for &'a OrderedSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for OrderedSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<Option<String>>::deserialize(deserializer)?;
        Ok(items.into_iter().flatten().collect())
    }
}

/// Organisation references by role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleMap {
    #[serde(default)]
    pub implementing: OrderedSet,
    #[serde(default)]
    pub programming: OrderedSet,
    #[serde(default)]
    pub funding: OrderedSet,
}

impl RoleMap {
    pub fn get(&self, role: Role) -> &OrderedSet {
        match role {
            Role::Implementing => &self.implementing,
            Role::Programming => &self.programming,
            Role::Funding => &self.funding,
        }
    }

    pub fn get_mut(&mut self, role: Role) -> &mut OrderedSet {
        match role {
            Role::Implementing => &mut self.implementing,
            Role::Programming => &mut self.programming,
            Role::Funding => &mut self.funding,
        }
    }

    /// Every (role, reference) pair, in role order
    pub fn iter(&self) -> impl Iterator<Item = (Role, &String)> {
        Role::ALL
            .into_iter()
            .flat_map(move |role| self.get(role).iter().map(move |r| (role, r)))
    }
}

/// Sector tokens by classification scheme
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorMap {
    #[serde(default)]
    pub dac: OrderedSet,
    #[serde(default)]
    pub humanitarian: OrderedSet,
}

impl SectorMap {
    pub fn get(&self, sector_type: SectorType) -> &OrderedSet {
        match sector_type {
            SectorType::Dac => &self.dac,
            SectorType::Humanitarian => &self.humanitarian,
        }
    }

    pub fn get_mut(&mut self, sector_type: SectorType) -> &mut OrderedSet {
        match sector_type {
            SectorType::Dac => &mut self.dac,
            SectorType::Humanitarian => &mut self.humanitarian,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.dac.is_empty() && self.humanitarian.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SectorType, &String)> {
        SectorType::ALL
            .into_iter()
            .flat_map(move |t| self.get(t).iter().map(move |s| (t, s)))
    }
}

/// Location references by administrative level, plus country codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationMap {
    #[serde(default)]
    pub admin1: OrderedSet,
    #[serde(default)]
    pub admin2: OrderedSet,
    #[serde(default)]
    pub unclassified: OrderedSet,
    #[serde(default)]
    pub countries: OrderedSet,
}

impl LocationMap {
    pub fn get(&self, level: Level) -> &OrderedSet {
        match level {
            Level::Admin1 => &self.admin1,
            Level::Admin2 => &self.admin2,
            Level::Unclassified => &self.unclassified,
        }
    }

    pub fn get_mut(&mut self, level: Level) -> &mut OrderedSet {
        match level {
            Level::Admin1 => &mut self.admin1,
            Level::Admin2 => &mut self.admin2,
            Level::Unclassified => &mut self.unclassified,
        }
    }

    /// Subnational references only (countries excluded)
    pub fn iter(&self) -> impl Iterator<Item = (Level, &String)> {
        Level::ALL
            .into_iter()
            .flat_map(move |l| self.get(l).iter().map(move |s| (l, s)))
    }

    /// Merge another map into this one, keeping order and uniqueness
    pub fn extend(&mut self, other: &LocationMap) {
        for (level, reference) in other.iter() {
            self.get_mut(level).insert(reference.clone());
        }
        for country in &other.countries {
            self.countries.insert(country.clone());
        }
    }
}

/// Start and end dates, either possibly unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dates {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// A canonical activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub identifier: String,
    pub source: Source,

    #[serde(default)]
    pub reported_by: Option<String>,

    #[serde(default)]
    pub humanitarian: bool,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub orgs: RoleMap,

    #[serde(default)]
    pub sectors: SectorMap,

    #[serde(default)]
    pub locations: LocationMap,

    #[serde(default)]
    pub dates: Dates,

    #[serde(default)]
    pub modalities: OrderedSet,

    /// Beneficiary counts; categories that were not reported are absent
    #[serde(default)]
    pub targeted: BTreeMap<Beneficiary, u64>,
}

impl Activity {
    /// Create an empty activity; the identifier may be filled in later
    pub fn new(identifier: impl Into<String>, source: Source) -> Self {
        Self {
            identifier: identifier.into(),
            source,
            reported_by: None,
            humanitarian: false,
            title: None,
            description: None,
            active: false,
            orgs: RoleMap::default(),
            sectors: SectorMap::default(),
            locations: LocationMap::default(),
            dates: Dates::default(),
            modalities: OrderedSet::new(),
            targeted: BTreeMap::new(),
        }
    }

    /// All distinct organisation references, including the reporter, in order
    pub fn participants(&self) -> OrderedSet {
        let mut all = OrderedSet::new();
        for (_, reference) in self.orgs.iter() {
            all.insert(reference.clone());
        }
        if let Some(ref reporter) = self.reported_by {
            all.insert(reporter.clone());
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_set_dedup_and_blank() {
        let mut set = OrderedSet::new();
        assert!(set.insert("wfp"));
        assert!(!set.insert("wfp"));
        assert!(!set.insert("  "));
        assert!(set.insert("unicef"));
        assert_eq!(set.as_slice(), &["wfp".to_string(), "unicef".to_string()]);
    }

    #[test]
    fn test_ordered_set_deserialize_drops_duplicates_and_nulls() {
        let set: OrderedSet = serde_json::from_str(r#"["a", null, "b", "a"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
        assert!(set.contains("b"));
    }

    #[test]
    fn test_source_tags() {
        assert_eq!(serde_json::to_string(&Source::ThreeW).unwrap(), "\"3W\"");
        let s: Source = serde_json::from_str("\"IATI\"").unwrap();
        assert_eq!(s, Source::Iati);
    }

    #[test]
    fn test_activity_schema_always_has_facets() {
        let activity = Activity::new("abc", Source::ThreeW);
        let value = serde_json::to_value(&activity).unwrap();
        assert!(value["orgs"]["funding"].as_array().unwrap().is_empty());
        assert!(value["sectors"]["dac"].as_array().unwrap().is_empty());
        assert!(value["locations"]["countries"].as_array().unwrap().is_empty());
        assert!(value["dates"]["start"].is_null());
        assert!(value["targeted"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_targeted_keys() {
        let mut activity = Activity::new("abc", Source::ThreeW);
        activity.targeted.insert(Beneficiary::TotalHouseholds, 12);
        let value = serde_json::to_value(&activity).unwrap();
        assert_eq!(value["targeted"]["total_households"], 12);
    }

    #[test]
    fn test_participants_include_reporter_once() {
        let mut activity = Activity::new("abc", Source::Iati);
        activity.orgs.implementing.insert("a");
        activity.orgs.funding.insert("b");
        activity.orgs.programming.insert("a");
        activity.reported_by = Some("b".into());
        let all = activity.participants();
        assert_eq!(all.as_slice(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_location_map_extend() {
        let mut a = LocationMap::default();
        a.admin1.insert("bay");
        let mut b = LocationMap::default();
        b.admin1.insert("bay");
        b.admin2.insert("baidoa");
        b.countries.insert("SO");
        a.extend(&b);
        assert_eq!(a.admin1.len(), 1);
        assert_eq!(a.admin2.len(), 1);
        assert_eq!(a.countries.len(), 1);
    }
}
