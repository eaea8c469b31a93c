//! Location entity type
//!
//! Locations form a strict hierarchy: regions (admin1) contain districts
//! (admin2), and unclassified places may sit under either or under nothing.
//! Every record carries the stubs of its ancestors.

use serde::{Deserialize, Serialize};

use crate::core::entity::{is_false, CanonicalEntity};

/// Administrative level of a location
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Admin1,
    Admin2,
    #[default]
    Unclassified,
}

impl Level {
    /// All levels, from least to most specific
    pub const ALL: [Level; 3] = [Level::Admin1, Level::Admin2, Level::Unclassified];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Admin1 => "admin1",
            Level::Admin2 => "admin2",
            Level::Unclassified => "unclassified",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin1" | "region" => Ok(Level::Admin1),
            "admin2" | "district" => Ok(Level::Admin2),
            "unclassified" => Ok(Level::Unclassified),
            _ => Err(format!("Unknown location level: {}", s)),
        }
    }
}

/// One node of the location reference hierarchy, as stored on disk
///
/// Children are kept as raw JSON so that a malformed child can be reported
/// with its own key.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationEntry {
    pub name: String,

    #[serde(default)]
    pub synonyms: Vec<String>,

    #[serde(default)]
    pub pcode: Option<String>,

    #[serde(default)]
    pub skip: bool,

    #[serde(default)]
    pub stub: Option<String>,

    #[serde(default)]
    pub admin2: serde_json::Map<String, serde_json::Value>,

    #[serde(default)]
    pub unclassified: serde_json::Map<String, serde_json::Value>,
}

/// A canonical location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub stub: String,
    pub name: String,
    pub level: Level,

    /// Stub of the enclosing region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,

    /// Stub of the enclosing district
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin2: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcode: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub skip: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unrecognised: bool,
}

impl Location {
    /// Build the canonical record for a reference entry at a known position
    pub fn from_entry(
        stub: String,
        entry: &LocationEntry,
        level: Level,
        admin1: Option<String>,
        admin2: Option<String>,
    ) -> Self {
        let name = crate::core::token::normalise_str(&entry.name).unwrap_or_else(|| entry.name.clone());
        Self {
            stub,
            name,
            level,
            admin1,
            admin2,
            pcode: entry.pcode.clone(),
            synonyms: entry.synonyms.clone(),
            skip: entry.skip,
            unrecognised: false,
        }
    }

    /// Synthesise an unclassified record for a place missing from the table
    pub fn provisional(stub: String, name: String) -> Self {
        Self {
            stub,
            name,
            level: Level::Unclassified,
            admin1: None,
            admin2: None,
            pcode: None,
            synonyms: Vec::new(),
            skip: false,
            unrecognised: true,
        }
    }
}

impl CanonicalEntity for Location {
    const KIND: &'static str = "location";

    fn stub(&self) -> &str {
        &self.stub
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn synonyms(&self) -> &[String] {
        &self.synonyms
    }

    fn skip(&self) -> bool {
        self.skip
    }

    fn unrecognised(&self) -> bool {
        self.unrecognised
    }
}
