//! Reference context - owns the loaded lookup tables for one pipeline run
//!
//! Each table is read from disk the first time a resolver needs it and kept
//! for the rest of the run. Provisional records synthesised for unmatched
//! names are cached back into the same tables, so repeat lookups are stable.

use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::config::{Config, ConfigError};
use crate::core::lookup::LookupTable;
use crate::core::reference::{
    build_location_table, build_org_table, build_sector_table, ReferenceError,
};
use crate::core::report::Reporter;
use crate::entities::location::Location;
use crate::entities::organisation::Organisation;
use crate::entities::sector::{Sector, SectorType};

/// Where each reference table lives
#[derive(Debug, Clone, Default)]
pub struct ReferencePaths {
    pub orgs: PathBuf,
    pub locations: PathBuf,
    pub dac: PathBuf,
    pub clusters: PathBuf,
}

impl ReferencePaths {
    pub fn from_config(config: &Config) -> Self {
        Self {
            orgs: config.org_map_path(),
            locations: config.location_map_path(),
            dac: config.dac_map_path(),
            clusters: config.cluster_map_path(),
        }
    }
}

/// Loaded reference tables plus per-run resolver state
pub struct ReferenceContext {
    paths: ReferencePaths,
    orgs: Option<LookupTable<Organisation>>,
    locations: Option<LookupTable<Location>>,
    dac: Option<LookupTable<Sector>>,
    clusters: Option<LookupTable<Sector>>,
    blocklist: Vec<Regex>,
    report_unrecognised: bool,
    reported: HashSet<String>,
    reporter: Reporter,
    country: String,
}

impl ReferenceContext {
    /// Create a context that loads tables from the configured paths
    pub fn new(config: &Config, reporter: Reporter) -> Result<Self, ConfigError> {
        let mut ctx = Self::detached(reporter);
        ctx.paths = ReferencePaths::from_config(config);
        ctx.set_blocklist(&config.org_blocklist)?;
        ctx.report_unrecognised = config.report_unrecognised || reporter.is_verbose();
        ctx.country = config.country.clone();
        Ok(ctx)
    }

    /// Create a context with no table paths; tables must be supplied with
    /// the `with_*` methods before they are used
    pub fn detached(reporter: Reporter) -> Self {
        let defaults = Config::default();
        let blocklist = compile_blocklist(&defaults.org_blocklist).unwrap_or_default();
        Self {
            paths: ReferencePaths::default(),
            orgs: None,
            locations: None,
            dac: None,
            clusters: None,
            blocklist,
            report_unrecognised: false,
            reported: HashSet::new(),
            reporter,
            country: defaults.country,
        }
    }

    pub fn with_orgs(mut self, table: LookupTable<Organisation>) -> Self {
        self.orgs = Some(table);
        self
    }

    pub fn with_locations(mut self, table: LookupTable<Location>) -> Self {
        self.locations = Some(table);
        self
    }

    pub fn with_dac(mut self, table: LookupTable<Sector>) -> Self {
        self.dac = Some(table);
        self
    }

    pub fn with_clusters(mut self, table: LookupTable<Sector>) -> Self {
        self.clusters = Some(table);
        self
    }

    /// Replace the organisation blocklist
    pub fn set_blocklist(&mut self, patterns: &[String]) -> Result<(), ConfigError> {
        self.blocklist = compile_blocklist(patterns)?;
        Ok(())
    }

    pub fn set_report_unrecognised(&mut self, report: bool) {
        self.report_unrecognised = report;
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Country code recorded on spreadsheet activities
    pub fn country(&self) -> &str {
        &self.country
    }

    /// True when a normalised organisation name matches the blocklist
    pub fn is_blocked(&self, name: &str) -> bool {
        self.blocklist.iter().any(|re| re.is_match(name))
    }

    /// Report a first-seen unrecognised name; returns false if already reported
    pub(crate) fn note_unrecognised(&mut self, kind: &str, token: &str, name: &str) -> bool {
        if !self.reported.insert(format!("{}:{}", kind, token)) {
            return false;
        }
        if self.report_unrecognised {
            self.reporter.warn(format!("New {}: {}", kind, name));
        }
        true
    }

    pub fn orgs(&mut self) -> Result<&mut LookupTable<Organisation>, ReferenceError> {
        load_table(&mut self.orgs, &self.paths.orgs, build_org_table)
    }

    pub fn locations(&mut self) -> Result<&mut LookupTable<Location>, ReferenceError> {
        load_table(&mut self.locations, &self.paths.locations, build_location_table)
    }

    pub fn sectors(
        &mut self,
        sector_type: SectorType,
    ) -> Result<&mut LookupTable<Sector>, ReferenceError> {
        match sector_type {
            SectorType::Dac => load_table(&mut self.dac, &self.paths.dac, |doc| {
                build_sector_table(doc, SectorType::Dac)
            }),
            SectorType::Humanitarian => {
                load_table(&mut self.clusters, &self.paths.clusters, |doc| {
                    build_sector_table(doc, SectorType::Humanitarian)
                })
            }
        }
    }
}

fn compile_blocklist(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(&format!("^(?:{})$", pattern))
                .case_insensitive(true)
                .build()
                .map_err(|e| ConfigError::Blocklist {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })
        })
        .collect()
}

/// Load a table into its slot on first use
fn load_table<'a, T: crate::core::entity::CanonicalEntity>(
    slot: &'a mut Option<LookupTable<T>>,
    path: &Path,
    build: impl FnOnce(&Value) -> Result<LookupTable<T>, ReferenceError>,
) -> Result<&'a mut LookupTable<T>, ReferenceError> {
    let table = match slot.take() {
        Some(table) => table,
        None => {
            if !path.is_file() {
                return Err(ReferenceError::Missing {
                    path: path.to_path_buf(),
                });
            }
            let doc: Value = crate::json::read_document(path)?;
            build(&doc)?
        }
    };
    Ok(slot.insert(table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_blocklist_whole_name_case_insensitive() {
        let ctx = ReferenceContext::detached(Reporter::silent());
        assert!(ctx.is_blocked("Allocation 2021 reserve"));
        assert!(ctx.is_blocked("ALLOCATION 7"));
        assert!(!ctx.is_blocked("Standard Allocation 2"));
        assert!(!ctx.is_blocked("Allocation"));
    }

    #[test]
    fn test_invalid_blocklist_pattern() {
        let mut ctx = ReferenceContext::detached(Reporter::silent());
        assert!(ctx.set_blocklist(&["(unclosed".to_string()]).is_err());
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let mut ctx = ReferenceContext::detached(Reporter::silent());
        assert!(matches!(ctx.orgs(), Err(ReferenceError::Missing { .. })));
    }

    #[test]
    fn test_table_loaded_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("org-map.json");
        std::fs::write(&path, r#"{"WFP": {"name": "World Food Programme"}}"#).unwrap();

        let mut config = Config::default();
        config.inputs = dir.path().to_path_buf();
        let mut ctx = ReferenceContext::new(&config, Reporter::silent()).unwrap();
        assert_eq!(ctx.orgs().unwrap().len(), 1);

        // Removing the file after first use must not matter
        std::fs::remove_file(&path).unwrap();
        assert!(ctx.orgs().unwrap().get("wfp").is_some());
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("org-map.json"), "{ \"WFP\": ").unwrap();
        let mut config = Config::default();
        config.inputs = dir.path().to_path_buf();
        let mut ctx = ReferenceContext::new(&config, Reporter::silent()).unwrap();
        assert!(matches!(ctx.orgs(), Err(ReferenceError::Json(_))));
    }

    #[test]
    fn test_note_unrecognised_once_per_token() {
        let mut ctx = ReferenceContext::detached(Reporter::silent());
        assert!(ctx.note_unrecognised("organisation", "new ngo", "New NGO"));
        assert!(!ctx.note_unrecognised("organisation", "new ngo", "NEW NGO"));
        assert!(ctx.note_unrecognised("location", "new ngo", "New NGO"));
    }
}
