//! IATI transparency-feed ingestion
//!
//! Input is a JSON array of activity records already extracted from the
//! feed. Organisations are matched by name first and by IATI org identifier
//! second; sectors by code first and by narrative second.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;

use crate::core::context::ReferenceContext;
use crate::core::entity::CanonicalEntity;
use crate::core::identity::normalise_date;
use crate::core::reference::ReferenceError;
use crate::core::token::normalise;
use crate::entities::activity::{Activity, Role, Source};
use crate::entities::location::Level;
use crate::entities::organisation::Organisation;
use crate::entities::sector::{Sector, SectorType};
use crate::pipeline::PipelineError;

/// IATI activity-status code for an activity in implementation
const STATUS_IMPLEMENTATION: &str = "2";

/// Accept codes written either as JSON strings or numbers
fn code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => normalise(Some(&s)),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept `true`/`false`, `1`/`0` and their string forms
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IatiOrg {
    pub name: Option<String>,

    #[serde(rename = "ref", deserialize_with = "code")]
    pub reference: Option<String>,

    #[serde(rename = "type", deserialize_with = "code")]
    pub org_type: Option<String>,

    #[serde(deserialize_with = "code")]
    pub role: Option<String>,
}

impl IatiOrg {
    /// An org mention counts only if it carries a name or an identifier
    pub fn is_present(&self) -> bool {
        normalise(self.name.as_deref()).is_some() || self.reference.is_some()
    }

    /// Role in the activity, from the IATI organisation-role code
    pub fn activity_role(&self) -> Option<Role> {
        match self.role.as_deref()? {
            "1" => Some(Role::Funding),
            "2" | "3" => Some(Role::Programming),
            "4" => Some(Role::Implementing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IatiSector {
    #[serde(deserialize_with = "code")]
    pub vocabulary: Option<String>,

    #[serde(deserialize_with = "code")]
    pub code: Option<String>,

    pub narrative: Option<String>,
}

impl IatiSector {
    /// Which sector table the vocabulary points at; DAC when unstated
    pub fn sector_type(&self) -> Option<SectorType> {
        match self.vocabulary.as_deref().unwrap_or("1") {
            "1" | "2" => Some(SectorType::Dac),
            "10" => Some(SectorType::Humanitarian),
            _ => None,
        }
    }

    /// Clusters and DAC 7xxxx codes (emergency response) count as humanitarian
    pub fn is_humanitarian(&self) -> bool {
        match self.sector_type() {
            Some(SectorType::Humanitarian) => true,
            Some(SectorType::Dac) => self.code.as_deref().is_some_and(|c| c.starts_with('7')),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IatiTransaction {
    #[serde(deserialize_with = "flag")]
    pub humanitarian: bool,
    pub sectors: Vec<IatiSector>,
    pub provider_org: Option<IatiOrg>,
    pub receiver_org: Option<IatiOrg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IatiLocation {
    pub name: Option<String>,
}

/// One activity record from the transparency feed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IatiRecord {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub reporting_org: Option<IatiOrg>,
    pub participating_orgs: Vec<IatiOrg>,
    pub sectors: Vec<IatiSector>,
    pub transactions: Vec<IatiTransaction>,
    pub locations: Vec<IatiLocation>,
    pub recipient_countries: Vec<String>,

    #[serde(deserialize_with = "code")]
    pub activity_status: Option<String>,

    pub start_date_planned: Option<String>,
    pub start_date_actual: Option<String>,
    pub end_date_planned: Option<String>,
    pub end_date_actual: Option<String>,

    #[serde(deserialize_with = "flag")]
    pub humanitarian: bool,

    pub humanitarian_scopes: Vec<Value>,
    pub aid_types: Vec<String>,
}

impl IatiRecord {
    /// Normalised activity identifier, if the record has one
    pub fn identifier(&self) -> Option<String> {
        normalise(self.identifier.as_deref())
    }

    /// Flagged humanitarian, scoped to an emergency, or touching a humanitarian sector
    pub fn is_humanitarian_related(&self) -> bool {
        self.humanitarian
            || !self.humanitarian_scopes.is_empty()
            || self.sectors.iter().any(IatiSector::is_humanitarian)
            || self
                .transactions
                .iter()
                .any(|t| t.humanitarian || t.sectors.iter().any(IatiSector::is_humanitarian))
    }

    /// Activity-level sectors, or transaction-level ones when the activity has none
    fn all_sectors(&self) -> Vec<&IatiSector> {
        if !self.sectors.is_empty() {
            return self.sectors.iter().collect();
        }
        self.transactions.iter().flat_map(|t| t.sectors.iter()).collect()
    }
}

/// Resolve a feed organisation, trying the name before the org identifier
fn resolve_feed_org(
    ctx: &mut ReferenceContext,
    org: &IatiOrg,
) -> Result<Option<Organisation>, ReferenceError> {
    let name = normalise(org.name.as_deref());
    let candidates = [name.as_deref(), org.reference.as_deref()];

    for candidate in candidates.into_iter().flatten() {
        if let Some(found) = ctx.resolve_org(candidate, false)? {
            return Ok(Some(found).filter(|o| !o.skip));
        }
    }
    // Nothing known; record under the name, or the identifier as a last resort
    let first = candidates.into_iter().flatten().next();
    match first {
        Some(text) => Ok(ctx.resolve_org(text, true)?.filter(|o| !o.skip)),
        None => Ok(None),
    }
}

/// Resolve a coded sector: code, then narrative, then free-text label
fn resolve_feed_sector(
    ctx: &mut ReferenceContext,
    sector: &IatiSector,
    sector_type: SectorType,
) -> Result<Option<Sector>, ReferenceError> {
    let narrative = normalise(sector.narrative.as_deref());
    for candidate in [sector.code.as_deref(), narrative.as_deref()].into_iter().flatten() {
        if let Some(found) = ctx.find_sector(candidate, sector_type)? {
            return Ok(Some(found));
        }
    }
    match narrative.as_deref().or(sector.code.as_deref()) {
        Some(label) => ctx.resolve_sector(label, sector_type),
        None => Ok(None),
    }
}

/// Build one activity from a feed record
///
/// Returns `None` when the record has no identifier or resolves to no
/// sectors at all.
pub fn make_activity(
    ctx: &mut ReferenceContext,
    record: &IatiRecord,
) -> Result<Option<Activity>, ReferenceError> {
    let Some(identifier) = record.identifier() else {
        return Ok(None);
    };
    let mut activity = Activity::new(identifier, Source::Iati);

    activity.title = normalise(record.title.as_deref());
    activity.description = normalise(record.description.as_deref());
    activity.humanitarian = record.is_humanitarian_related();
    activity.active = record.activity_status.as_deref() == Some(STATUS_IMPLEMENTATION);
    activity.dates.start = normalise_date(
        record
            .start_date_actual
            .as_deref()
            .or(record.start_date_planned.as_deref()),
    );
    activity.dates.end = normalise_date(
        record
            .end_date_actual
            .as_deref()
            .or(record.end_date_planned.as_deref()),
    );

    if let Some(ref reporting) = record.reporting_org {
        if let Some(org) = resolve_feed_org(ctx, reporting)? {
            activity.reported_by = Some(org.reference().to_string());
        }
    }

    for participant in &record.participating_orgs {
        let Some(role) = participant.activity_role() else {
            continue;
        };
        if let Some(org) = resolve_feed_org(ctx, participant)? {
            activity.orgs.get_mut(role).insert(org.reference());
        }
    }

    for sector in record.all_sectors() {
        let Some(sector_type) = sector.sector_type() else {
            continue;
        };
        let Some(resolved) = resolve_feed_sector(ctx, sector, sector_type)? else {
            continue;
        };
        if resolved.skip {
            continue;
        }
        activity.sectors.get_mut(sector_type).insert(resolved.reference());
        if sector_type == SectorType::Dac {
            if let Some(cluster) = ctx.cluster_for_dac(&resolved)? {
                if !cluster.skip {
                    activity.sectors.humanitarian.insert(cluster.reference());
                }
            }
        }
    }

    if activity.sectors.is_empty() {
        return Ok(None);
    }

    let mut found = Vec::new();
    for location in &record.locations {
        if let Some(name) = location.name.as_deref() {
            if let Some(resolved) = ctx.resolve_location(name, Level::Unclassified)? {
                if !resolved.skip {
                    found.push(resolved);
                }
            }
        }
    }
    activity.locations = ctx.place_locations(&found, false);
    for country in &record.recipient_countries {
        activity.locations.countries.insert(country.trim().to_uppercase());
    }

    for aid_type in &record.aid_types {
        if let Some(modality) = normalise(Some(aid_type)) {
            activity.modalities.insert(modality);
        }
    }

    Ok(Some(activity))
}

/// Read feed records from a JSON file (an array of records, or one record)
pub fn read_records(path: &Path) -> Result<Vec<Value>, PipelineError> {
    let doc: Value = crate::json::read_document(path)?;
    match doc {
        Value::Array(items) => Ok(items),
        Value::Object(_) => Ok(vec![doc]),
        _ => Err(PipelineError::Activities {
            path: path.to_path_buf(),
            message: "expected a JSON array of IATI activity records".to_string(),
        }),
    }
}

/// Read and build every activity in one feed file
///
/// Bad records are reported and skipped; only structural problems abort.
pub fn read_iati(ctx: &mut ReferenceContext, path: &Path) -> Result<Vec<Activity>, PipelineError> {
    let mut activities = Vec::new();
    let mut dropped = 0;

    for (i, raw) in read_records(path)?.into_iter().enumerate() {
        let record: IatiRecord = match serde_json::from_value(raw) {
            Ok(r) => r,
            Err(e) => {
                ctx.reporter()
                    .error(format!("{} record #{}: {}", path.display(), i + 1, e));
                continue;
            }
        };
        if record.identifier().is_none() {
            ctx.reporter().warn(format!(
                "{} record #{}: no identifier, skipped",
                path.display(),
                i + 1
            ));
            continue;
        }
        match make_activity(ctx, &record)? {
            Some(activity) => activities.push(activity),
            None => dropped += 1,
        }
    }

    ctx.reporter().detail(format!(
        "{}: {} activities, {} without sectors dropped",
        path.display(),
        activities.len(),
        dropped
    ));
    Ok(activities)
}
