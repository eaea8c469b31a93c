//! Organisation entity type

use serde::{Deserialize, Serialize};

use crate::core::entity::{is_false, CanonicalEntity};

/// Organisational reach
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Local,
    Regional,
    International,
    #[default]
    Unknown,
}

impl Scope {
    /// All scopes, in bucket order
    pub const ALL: [Scope; 4] = [
        Scope::Local,
        Scope::Regional,
        Scope::International,
        Scope::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Local => "local",
            Scope::Regional => "regional",
            Scope::International => "international",
            Scope::Unknown => "unknown",
        }
    }

    /// Group number used by the network diagram
    pub fn group(&self) -> u8 {
        match self {
            Scope::Unknown => 0,
            Scope::Local => 1,
            Scope::Regional => 2,
            Scope::International => 3,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Scope::Local),
            "regional" => Ok(Scope::Regional),
            "international" => Ok(Scope::International),
            "unknown" => Ok(Scope::Unknown),
            _ => Err(format!("Unknown scope: {}", s)),
        }
    }
}

/// One entry of the organisation reference table, as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct OrgEntry {
    pub name: String,

    #[serde(default)]
    pub shortname: Option<String>,

    #[serde(default)]
    pub scope: Scope,

    #[serde(default)]
    pub synonyms: Vec<String>,

    #[serde(default)]
    pub skip: bool,

    #[serde(default)]
    pub iati_id: Option<String>,

    /// Overrides the stub derived from the table key
    #[serde(default)]
    pub stub: Option<String>,
}

/// A canonical organisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organisation {
    pub stub: String,
    pub name: String,
    pub shortname: String,
    pub scope: Scope,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iati_id: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub skip: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unrecognised: bool,
}

impl Organisation {
    /// Build the canonical record for a reference entry
    pub fn from_entry(stub: String, entry: OrgEntry) -> Self {
        let name = crate::core::token::normalise_str(&entry.name).unwrap_or(entry.name);
        let shortname = entry
            .shortname
            .as_deref()
            .and_then(crate::core::token::normalise_str)
            .unwrap_or_else(|| name.clone());
        Self {
            stub,
            name,
            shortname,
            scope: entry.scope,
            synonyms: entry.synonyms,
            iati_id: entry.iati_id,
            skip: entry.skip,
            unrecognised: false,
        }
    }

    /// Synthesise a record for a name missing from the reference table
    pub fn provisional(stub: String, name: String) -> Self {
        Self {
            stub,
            shortname: name.clone(),
            name,
            scope: Scope::Unknown,
            synonyms: Vec::new(),
            iati_id: None,
            skip: false,
            unrecognised: true,
        }
    }
}

impl CanonicalEntity for Organisation {
    const KIND: &'static str = "organisation";

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
