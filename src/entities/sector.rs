//! Sector entity type (DAC purpose codes and humanitarian clusters)

use serde::{Deserialize, Serialize};

use crate::core::entity::{is_false, CanonicalEntity};

/// Sector classification scheme
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SectorType {
    Dac,
    Humanitarian,
}

impl SectorType {
    pub const ALL: [SectorType; 2] = [SectorType::Dac, SectorType::Humanitarian];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectorType::Dac => "dac",
            SectorType::Humanitarian => "humanitarian",
        }
    }
}

impl std::fmt::Display for SectorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a sector reference table, as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct SectorEntry {
    pub name: String,

    #[serde(default, rename = "dac-group")]
    pub dac_group: Option<String>,

    /// Key of the humanitarian cluster this DAC code maps to
    #[serde(default)]
    pub humanitarian: Option<String>,

    #[serde(default)]
    pub synonyms: Vec<String>,

    #[serde(default)]
    pub skip: bool,

    #[serde(default)]
    pub stub: Option<String>,
}

/// A canonical sector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub stub: String,
    pub name: String,

    #[serde(rename = "type")]
    pub sector_type: SectorType,

    #[serde(default, rename = "dac-group", skip_serializing_if = "Option::is_none")]
    pub dac_group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humanitarian: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub skip: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub unrecognised: bool,
}

impl Sector {
    pub fn from_entry(stub: String, entry: SectorEntry, sector_type: SectorType) -> Self {
        let name = crate::core::token::normalise_str(&entry.name).unwrap_or(entry.name);
        Self {
            stub,
            name,
            sector_type,
            dac_group: entry.dac_group,
            humanitarian: entry.humanitarian,
            synonyms: entry.synonyms,
            skip: entry.skip,
            unrecognised: false,
        }
    }

    /// Free-text label with no canonical mapping
    pub fn provisional(stub: String, name: String, sector_type: SectorType) -> Self {
        Self {
            stub,
            name,
            sector_type,
            dac_group: None,
            humanitarian: None,
            synonyms: Vec::new(),
            skip: false,
            unrecognised: true,
        }
    }
}

impl CanonicalEntity for Sector {
    const KIND: &'static str = "sector";

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

    /// Sectors are always recorded by token, even free-text labels
    fn reference(&self) -> &str {
        &self.stub
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_dac_group_rename() {
        let entry: SectorEntry = serde_json::from_value(serde_json::json!({
            "name": "Basic health care",
            "dac-group": "Health",
            "humanitarian": "Health"
        }))
        .unwrap();
        assert_eq!(entry.dac_group.as_deref(), Some("Health"));
        assert_eq!(entry.humanitarian.as_deref(), Some("Health"));
    }

    #[test]
    fn test_provisional_reference_is_token() {
        let sector = Sector::provisional(
            "child protection".into(),
            "Child Protection".into(),
            SectorType::Humanitarian,
        );
        assert_eq!(sector.reference(), "child protection");
    }
}
