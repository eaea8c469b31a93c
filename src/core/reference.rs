//! Reference table construction
//!
//! Reference datasets are curated JSON mappings kept under version control.
//! They are flattened here into token-keyed [`LookupTable`]s. Registration
//! runs in priority passes so that a token claimed by a stronger alias
//! (primary key over name over shortname over synonym, region over district
//! over place) is never taken over by a weaker one.

use miette::Diagnostic;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

use crate::core::lookup::LookupTable;
use crate::core::token::make_stub;
use crate::entities::location::{Level, Location, LocationEntry};
use crate::entities::organisation::{OrgEntry, Organisation};
use crate::entities::sector::{Sector, SectorEntry, SectorType};
use crate::json::JsonError;

/// Structural errors in reference data - always fatal
#[derive(Debug, Error, Diagnostic)]
pub enum ReferenceError {
    #[error("reference table not found: {}", path.display())]
    #[diagnostic(
        code(aidmap::reference::missing),
        help("set `inputs` in aidmap.yaml or the AIDMAP_INPUTS variable to the directory holding the reference tables")
    )]
    Missing { path: PathBuf },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Json(#[from] JsonError),

    #[error("malformed {table} entry '{key}': {message}")]
    #[diagnostic(code(aidmap::reference::entry))]
    MalformedEntry {
        table: &'static str,
        key: String,
        message: String,
    },

    #[error("{table} table must be a JSON object keyed by name")]
    #[diagnostic(code(aidmap::reference::shape))]
    NotAnObject { table: &'static str },
}

fn parse_entry<E: DeserializeOwned>(
    table: &'static str,
    key: &str,
    raw: &Value,
) -> Result<E, ReferenceError> {
    serde_json::from_value(raw.clone()).map_err(|e| ReferenceError::MalformedEntry {
        table,
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn duplicate_stub(table: &'static str, key: &str, stub: &str) -> ReferenceError {
    ReferenceError::MalformedEntry {
        table,
        key: key.to_string(),
        message: format!("stub '{}' is already taken by another entry", stub),
    }
}

fn as_object<'a>(table: &'static str, doc: &'a Value) -> Result<&'a Map<String, Value>, ReferenceError> {
    doc.as_object().ok_or(ReferenceError::NotAnObject { table })
}

/// Aliases of one record, grouped by registration pass
struct Pending {
    slot: usize,
    passes: Vec<Vec<String>>,
}

/// Register aliases pass by pass across all pending records
fn register_passes<T: crate::core::entity::CanonicalEntity>(
    table: &mut LookupTable<T>,
    pending: &[Pending],
) {
    let depth = pending.iter().map(|p| p.passes.len()).max().unwrap_or(0);
    for pass in 0..depth {
        for item in pending {
            if let Some(aliases) = item.passes.get(pass) {
                for alias in aliases {
                    table.register(alias, item.slot);
                }
            }
        }
    }
}

/// Build the organisation lookup table
///
/// Input: `{key: {name, shortname?, scope?, synonyms?, skip?, iati_id?, stub?}}`
pub fn build_org_table(doc: &Value) -> Result<LookupTable<Organisation>, ReferenceError> {
    const TABLE: &str = "organisation";
    let map = as_object(TABLE, doc)?;
    let mut table = LookupTable::new();
    let mut pending = Vec::with_capacity(map.len());

    for (key, raw) in map {
        let entry: OrgEntry = parse_entry(TABLE, key, raw)?;
        let stub = entry.stub.clone().unwrap_or_else(|| make_stub(key));
        if stub.is_empty() {
            return Err(ReferenceError::MalformedEntry {
                table: TABLE,
                key: key.clone(),
                message: "key yields an empty stub".to_string(),
            });
        }

        let org = Organisation::from_entry(stub.clone(), entry);
        let mut shortnames = vec![org.shortname.clone()];
        if org.shortname != org.name {
            shortnames.push(format!("{} ({})", org.name, org.shortname));
        }
        let mut synonyms = org.synonyms.clone();
        synonyms.extend(org.iati_id.iter().cloned());
        let passes = vec![vec![key.clone()], vec![org.name.clone()], shortnames, synonyms];

        let slot = table
            .claim(org)
            .map_err(|_| duplicate_stub(TABLE, key, &stub))?;
        pending.push(Pending { slot, passes });
    }

    register_passes(&mut table, &pending);
    Ok(table)
}

/// Build a flat sector lookup table (DAC codes or humanitarian clusters)
///
/// Input: `{key: {name, dac-group?, humanitarian?, synonyms?, skip?, stub?}}`
pub fn build_sector_table(
    doc: &Value,
    sector_type: SectorType,
) -> Result<LookupTable<Sector>, ReferenceError> {
    let table_name = match sector_type {
        SectorType::Dac => "DAC sector",
        SectorType::Humanitarian => "humanitarian cluster",
    };
    let map = as_object(table_name, doc)?;
    let mut table = LookupTable::new();
    let mut pending = Vec::with_capacity(map.len());

    for (key, raw) in map {
        let entry: SectorEntry = parse_entry(table_name, key, raw)?;
        let stub = entry.stub.clone().unwrap_or_else(|| make_stub(key));
        let sector = Sector::from_entry(stub.clone(), entry, sector_type);
        let passes = vec![vec![key.clone()], vec![sector.name.clone()], sector.synonyms.clone()];
        let slot = table
            .claim(sector)
            .map_err(|_| duplicate_stub(table_name, key, &stub))?;
        pending.push(Pending { slot, passes });
    }

    register_passes(&mut table, &pending);
    Ok(table)
}

/// A location entry waiting to be registered
struct Node {
    key: String,
    entry: LocationEntry,
    admin1: Option<String>,
    admin2: Option<String>,
}

fn parse_children(
    children: &Map<String, Value>,
    path: &str,
    admin1: Option<&str>,
    admin2: Option<&str>,
) -> Result<Vec<Node>, ReferenceError> {
    let mut nodes = Vec::with_capacity(children.len());
    for (key, raw) in children {
        let entry: LocationEntry = parse_entry("location", &format!("{}{}", path, key), raw)?;
        nodes.push(Node {
            key: key.clone(),
            entry,
            admin1: admin1.map(str::to_string),
            admin2: admin2.map(str::to_string),
        });
    }
    Ok(nodes)
}

/// Build the location lookup table from the nested hierarchy
///
/// Input: `{admin1: {region: {name, synonyms?, admin2: {district: {..., unclassified: {...}}},
/// unclassified: {...}}}, unclassified: {...}}`
///
/// Registration is breadth-first: regions, then districts, then places under
/// districts, then places under regions, then top-level places. Each record
/// carries the stubs of its ancestors.
pub fn build_location_table(doc: &Value) -> Result<LookupTable<Location>, ReferenceError> {
    const TABLE: &str = "location";
    let root = as_object(TABLE, doc)?;
    let empty = Map::new();
    let regions_raw = match root.get("admin1") {
        Some(v) => as_object(TABLE, v)?,
        None => &empty,
    };
    let places_raw = match root.get("unclassified") {
        Some(v) => as_object(TABLE, v)?,
        None => &empty,
    };

    let mut table = LookupTable::new();

    // pass 1: regions
    let regions = parse_children(regions_raw, "", None, None)?;
    let region_stubs = add_level(&mut table, &regions, Level::Admin1)?;

    // pass 2: districts
    let mut districts = Vec::new();
    for (region, region_stub) in regions.iter().zip(&region_stubs) {
        let path = format!("{}/", region.key);
        districts.extend(parse_children(&region.entry.admin2, &path, Some(region_stub), None)?);
    }
    let district_stubs = add_level(&mut table, &districts, Level::Admin2)?;

    // pass 3: places under districts
    let mut places = Vec::new();
    for (district, district_stub) in districts.iter().zip(&district_stubs) {
        let path = format!("{}/", district.key);
        places.extend(parse_children(
            &district.entry.unclassified,
            &path,
            district.admin1.as_deref(),
            Some(district_stub),
        )?);
    }
    add_level(&mut table, &places, Level::Unclassified)?;

    // pass 4: places under regions
    let mut places = Vec::new();
    for (region, region_stub) in regions.iter().zip(&region_stubs) {
        let path = format!("{}/", region.key);
        places.extend(parse_children(&region.entry.unclassified, &path, Some(region_stub), None)?);
    }
    add_level(&mut table, &places, Level::Unclassified)?;

    // pass 5: top-level places
    let places = parse_children(places_raw, "", None, None)?;
    add_level(&mut table, &places, Level::Unclassified)?;

    Ok(table)
}

/// Store one level of nodes and register their aliases; returns their stubs
fn add_level(
    table: &mut LookupTable<Location>,
    nodes: &[Node],
    level: Level,
) -> Result<Vec<String>, ReferenceError> {
    let mut pending = Vec::with_capacity(nodes.len());
    let mut result = Vec::with_capacity(nodes.len());

    for node in nodes {
        let mut stub = node.entry.stub.clone().unwrap_or_else(|| make_stub(&node.key));
        if stub.is_empty() {
            return Err(ReferenceError::MalformedEntry {
                table: "location",
                key: node.key.clone(),
                message: "key yields an empty stub".to_string(),
            });
        }
        // Token already taken by a higher level: a region and its capital
        // district share a name, or a region lists the district as a synonym
        if table.contains(&stub) {
            let parent = node.admin2.as_deref().or(node.admin1.as_deref()).unwrap_or(level.as_str());
            stub = make_stub(&format!("{} {}", parent, stub));
        }

        let location = Location::from_entry(
            stub.clone(),
            &node.entry,
            level,
            node.admin1.clone(),
            node.admin2.clone(),
        );
        let mut aliases = location.synonyms.clone();
        aliases.extend(location.pcode.iter().cloned());
        let passes = vec![vec![node.key.clone()], vec![location.name.clone()], aliases];

        let slot = table
            .claim(location)
            .map_err(|_| duplicate_stub("location", &node.key, &stub))?;
        pending.push(Pending { slot, passes });
        result.push(stub);
    }

    register_passes(table, &pending);
    Ok(result)
}
