//! Configuration management with layered hierarchy

use miette::Diagnostic;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory config file
pub const LOCAL_CONFIG_FILE: &str = "aidmap.yaml";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read config file {}: {message}", path.display())]
    #[diagnostic(code(aidmap::config::read))]
    Read { path: PathBuf, message: String },

    #[error("invalid config file {}: {message}", path.display())]
    #[diagnostic(code(aidmap::config::parse), help("see the Config fields: inputs, org_map, location_map, dac_map, cluster_map, country, org_blocklist, report_unrecognised"))]
    Parse { path: PathBuf, message: String },

    #[error("invalid organisation blocklist pattern '{pattern}': {message}")]
    #[diagnostic(code(aidmap::config::blocklist))]
    Blocklist { pattern: String, message: String },
}

/// Aidmap configuration with layered hierarchy
///
/// Every field is optional in a config file; unset fields keep the value of
/// the layer below.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub inputs: Option<PathBuf>,
    pub org_map: Option<PathBuf>,
    pub location_map: Option<PathBuf>,
    pub dac_map: Option<PathBuf>,
    pub cluster_map: Option<PathBuf>,
    pub country: Option<String>,
    pub org_blocklist: Option<Vec<String>>,
    pub report_unrecognised: Option<bool>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the reference tables
    pub inputs: PathBuf,

    /// Organisation reference table (relative to `inputs`)
    pub org_map: PathBuf,

    /// Location hierarchy (relative to `inputs`)
    pub location_map: PathBuf,

    /// DAC purpose-code table (relative to `inputs`)
    pub dac_map: PathBuf,

    /// Humanitarian cluster table (relative to `inputs`)
    pub cluster_map: PathBuf,

    /// Country code recorded on spreadsheet activities
    pub country: String,

    /// Organisation names rejected outright (whole-name, case-insensitive regexes)
    pub org_blocklist: Vec<String>,

    /// Print each first-seen unrecognised organisation to stderr
    pub report_unrecognised: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: PathBuf::from("inputs"),
            org_map: PathBuf::from("org-map.json"),
            location_map: PathBuf::from("location-map.json"),
            dac_map: PathBuf::from("dac3-sector-map.json"),
            cluster_map: PathBuf::from("humanitarian-cluster-map.json"),
            country: "SO".to_string(),
            org_blocklist: vec![r"Allocation \d+.*".to_string()],
            report_unrecognised: false,
        }
    }
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    ///
    /// `explicit` is a file named on the command line; unlike the implicit
    /// layers it must exist and parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/aidmap/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                if let Ok(contents) = std::fs::read_to_string(&global_path) {
                    if let Ok(global) = serde_yml::from_str::<ConfigLayer>(&contents) {
                        config.merge(global);
                    }
                }
            }
        }

        // 3. Explicit file, or aidmap.yaml in the working directory
        match explicit {
            Some(path) => config.merge(Self::read_layer(path)?),
            None => {
                let local = Path::new(LOCAL_CONFIG_FILE);
                if local.exists() {
                    config.merge(Self::read_layer(local)?);
                }
            }
        }

        // 4. Environment variables
        if let Ok(inputs) = std::env::var("AIDMAP_INPUTS") {
            config.inputs = PathBuf::from(inputs);
        }
        if let Ok(country) = std::env::var("AIDMAP_COUNTRY") {
            config.country = country;
        }

        Ok(config)
    }

    /// Parse one config file
    pub fn read_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if contents.trim().is_empty() {
            return Ok(ConfigLayer::default());
        }
        serde_yml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "aidmap")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another layer into this one (other takes precedence)
    pub fn merge(&mut self, other: ConfigLayer) {
        if let Some(inputs) = other.inputs {
            self.inputs = inputs;
        }
        if let Some(org_map) = other.org_map {
            self.org_map = org_map;
        }
        if let Some(location_map) = other.location_map {
            self.location_map = location_map;
        }
        if let Some(dac_map) = other.dac_map {
            self.dac_map = dac_map;
        }
        if let Some(cluster_map) = other.cluster_map {
            self.cluster_map = cluster_map;
        }
        if let Some(country) = other.country {
            self.country = country;
        }
        if let Some(blocklist) = other.org_blocklist {
            self.org_blocklist = blocklist;
        }
        if let Some(report) = other.report_unrecognised {
            self.report_unrecognised = report;
        }
    }

    /// Full path of a reference table
    pub fn table_path(&self, table: &Path) -> PathBuf {
        if table.is_absolute() {
            table.to_path_buf()
        } else {
            self.inputs.join(table)
        }
    }

    pub fn org_map_path(&self) -> PathBuf {
        self.table_path(&self.org_map)
    }

    pub fn location_map_path(&self) -> PathBuf {
        self.table_path(&self.location_map)
    }

    pub fn dac_map_path(&self) -> PathBuf {
        self.table_path(&self.dac_map)
    }

    pub fn cluster_map_path(&self) -> PathBuf {
        self.table_path(&self.cluster_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.org_map_path(), PathBuf::from("inputs/org-map.json"));
        assert_eq!(config.country, "SO");
        assert_eq!(config.org_blocklist.len(), 1);
        assert!(!config.report_unrecognised);
    }

    #[test]
    fn test_merge_overrides_only_set_fields() {
        let mut config = Config::default();
        config.merge(ConfigLayer {
            inputs: Some(PathBuf::from("/data/ref")),
            country: Some("KE".to_string()),
            ..Default::default()
        });
        assert_eq!(config.inputs, PathBuf::from("/data/ref"));
        assert_eq!(config.country, "KE");
        assert_eq!(config.org_map, PathBuf::from("org-map.json"));
        assert_eq!(
            config.location_map_path(),
            PathBuf::from("/data/ref/location-map.json")
        );
    }

    #[test]
    fn test_absolute_table_path_kept() {
        let mut config = Config::default();
        config.dac_map = PathBuf::from("/elsewhere/dac.json");
        assert_eq!(config.dac_map_path(), PathBuf::from("/elsewhere/dac.json"));
    }

    #[test]
    fn test_read_layer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aidmap.yaml");
        std::fs::write(
            &path,
            "inputs: refs\nreport_unrecognised: true\norg_blocklist:\n  - 'Test .*'\n",
        )
        .unwrap();
        let layer = Config::read_layer(&path).unwrap();
        assert_eq!(layer.inputs, Some(PathBuf::from("refs")));
        assert_eq!(layer.report_unrecognised, Some(true));
        assert_eq!(layer.org_blocklist, Some(vec!["Test .*".to_string()]));
    }

    #[test]
    fn test_read_layer_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aidmap.yaml");
        std::fs::write(&path, "report_unrecognised: [not, a, bool]\n").unwrap();
        assert!(matches!(
            Config::read_layer(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let result = Config::load(Some(Path::new("/nonexistent/aidmap.yaml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
