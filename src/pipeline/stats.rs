//! Organisation-reference statistics for IATI feed files
//!
//! Shows how often publishers identify their partners with an org
//! identifier, broken down by where the org appears and its org type.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tabled::{builder::Builder, settings::Style};

use crate::core::report::Reporter;
use crate::pipeline::iati::{read_records, IatiOrg, IatiRecord};
use crate::pipeline::PipelineError;

/// Org type key used when a reference carries no type code
const UNSPECIFIED: &str = "unspecified";

/// Where an organisation is mentioned in a feed record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Involvement {
    Reporting,
    Participating,
    Provider,
    Receiver,
}

impl Involvement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Involvement::Reporting => "reporting",
            Involvement::Participating => "participating",
            Involvement::Provider => "provider",
            Involvement::Receiver => "receiver",
        }
    }
}

type Tally = BTreeMap<Involvement, BTreeMap<String, u64>>;

/// Counts of org references with and without an org identifier
#[derive(Debug, Default, Serialize)]
pub struct FeedStats {
    pub activities: usize,
    pub orgs_with_ref: Tally,
    pub orgs_without_ref: Tally,

    #[serde(skip)]
    seen: HashSet<String>,
}

impl FeedStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one record's org references; returns false for a repeated identifier
    pub fn add_record(&mut self, record: &IatiRecord) -> bool {
        if let Some(identifier) = record.identifier() {
            if !self.seen.insert(identifier) {
                return false;
            }
        }
        self.activities += 1;

        self.record_org(record.reporting_org.as_ref(), Involvement::Reporting);
        for org in &record.participating_orgs {
            self.record_org(Some(org), Involvement::Participating);
        }
        for transaction in &record.transactions {
            self.record_org(transaction.provider_org.as_ref(), Involvement::Provider);
            self.record_org(transaction.receiver_org.as_ref(), Involvement::Receiver);
        }
        true
    }

    /// Count every record in a feed file, reporting unreadable records
    pub fn add_file(&mut self, path: &Path, reporter: &Reporter) -> Result<(), PipelineError> {
        for (i, raw) in read_records(path)?.into_iter().enumerate() {
            match serde_json::from_value::<IatiRecord>(raw) {
                Ok(record) => {
                    self.add_record(&record);
                }
                Err(e) => reporter.error(format!("{} record #{}: {}", path.display(), i + 1, e)),
            }
        }
        Ok(())
    }

    fn record_org(&mut self, org: Option<&IatiOrg>, involvement: Involvement) {
        let Some(org) = org.filter(|o| o.is_present()) else {
            return;
        };
        let tally = if org.reference.is_some() {
            &mut self.orgs_with_ref
        } else {
            &mut self.orgs_without_ref
        };
        let org_type = org.org_type.clone().unwrap_or_else(|| UNSPECIFIED.to_string());
        *tally.entry(involvement).or_default().entry(org_type).or_insert(0) += 1;
    }

    /// Render as a markdown table, one row per involvement and org type
    pub fn to_markdown(&self) -> String {
        let mut keys: Vec<(Involvement, &String)> = self
            .orgs_with_ref
            .iter()
            .chain(&self.orgs_without_ref)
            .flat_map(|(involvement, types)| types.keys().map(move |t| (*involvement, t)))
            .collect();
        keys.sort();
        keys.dedup();

        let count = |tally: &Tally, involvement: Involvement, org_type: &str| {
            tally
                .get(&involvement)
                .and_then(|types| types.get(org_type))
                .copied()
                .unwrap_or(0)
        };

        let mut builder = Builder::default();
        builder.push_record(["Involvement", "Org type", "With ref", "Without ref"]);
        for (involvement, org_type) in keys {
            builder.push_record([
                involvement.as_str().to_string(),
                org_type.clone(),
                count(&self.orgs_with_ref, involvement, org_type).to_string(),
                count(&self.orgs_without_ref, involvement, org_type).to_string(),
            ]);
        }
        builder.build().with(Style::markdown()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> IatiRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_counts_by_involvement_and_type() {
        let mut stats = FeedStats::new();
        stats.add_record(&record(json!({
            "identifier": "A",
            "reporting_org": { "ref": "XM-1", "type": "40", "name": "UN Agency" },
            "participating_orgs": [
                { "name": "Local NGO", "type": "24", "role": "4" },
                { "ref": "GB-CHC-1", "type": "21", "role": "1" },
                { "type": "24", "role": "4" }
            ],
            "transactions": [
                { "provider_org": { "name": "Donor" }, "receiver_org": { "ref": "XM-1", "type": 40 } }
            ]
        })));

        assert_eq!(stats.activities, 1);
        assert_eq!(stats.orgs_with_ref[&Involvement::Reporting]["40"], 1);
        assert_eq!(stats.orgs_with_ref[&Involvement::Participating]["21"], 1);
        assert_eq!(stats.orgs_without_ref[&Involvement::Participating]["24"], 1);
        assert_eq!(stats.orgs_without_ref[&Involvement::Provider]["unspecified"], 1);
        assert_eq!(stats.orgs_with_ref[&Involvement::Receiver]["40"], 1);
    }

    #[test]
    fn test_duplicate_activities_counted_once() {
        let mut stats = FeedStats::new();
        let rec = record(json!({ "identifier": "A", "reporting_org": { "ref": "XM-1" } }));
        assert!(stats.add_record(&rec));
        assert!(!stats.add_record(&rec));
        assert_eq!(stats.activities, 1);
        assert_eq!(stats.orgs_with_ref[&Involvement::Reporting]["unspecified"], 1);
    }

    #[test]
    fn test_json_shape() {
        let mut stats = FeedStats::new();
        stats.add_record(&record(json!({ "identifier": "A", "reporting_org": { "name": "X", "type": "10" } })));
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["orgs_without_ref"]["reporting"]["10"], 1);
        assert!(value.get("seen").is_none());
    }

    #[test]
    fn test_markdown_table() {
        let mut stats = FeedStats::new();
        stats.add_record(&record(json!({
            "identifier": "A",
            "reporting_org": { "ref": "XM-1", "type": "40" },
            "participating_orgs": [{ "name": "Local NGO", "type": "24" }]
        })));
        let md = stats.to_markdown();
        assert!(md.contains("| Involvement"));
        assert!(md.contains("| reporting"));
        assert!(md.contains("| participating"));
    }
}
