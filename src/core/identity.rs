//! Activity identity and date normalisation
//!
//! Spreadsheet activities have no natural key, so their identifier is a
//! content hash over the resolved fields. The hash input is the compact
//! JSON array `[title, description, orgs, sectors, locations]`, so the same
//! logical activity yields the same identifier on every run.

use chrono::{DateTime, NaiveDate};
use sha2::{Digest, Sha256};

use crate::core::token::normalise;
use crate::entities::activity::Activity;

/// Number of hex characters kept from the digest
pub const PSEUDO_ID_LEN: usize = 16;

/// Date formats tried, in order, before falling back to the raw text
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%b-%Y"];

/// Compute the content-derived identifier for an activity
pub fn pseudo_identifier(activity: &Activity) -> String {
    let content = serde_json::json!([
        activity.title,
        activity.description,
        activity.orgs,
        activity.sectors,
        activity.locations,
    ]);
    let mut hasher = Sha256::new();
    hasher.update(content.to_string().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..PSEUDO_ID_LEN].to_string()
}

/// Normalise a date to `YYYY-MM-DD` when it is in a recognised format
///
/// Unrecognised text is kept (whitespace-normalised) so nothing is lost.
pub fn normalise_date(raw: Option<&str>) -> Option<String> {
    let text = normalise(raw)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::activity::Source;

    fn sample() -> Activity {
        let mut activity = Activity::new("", Source::ThreeW);
        activity.title = Some("Water trucking".into());
        activity.description = Some("Emergency water".into());
        activity.orgs.implementing.insert("wfp");
        activity.sectors.humanitarian.insert("wash");
        activity.locations.admin1.insert("bay");
        activity
    }

    #[test]
    fn test_pseudo_identifier_stable() {
        let a = sample();
        let b = sample();
        let id = pseudo_identifier(&a);
        assert_eq!(id.len(), PSEUDO_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, pseudo_identifier(&b));
    }

    #[test]
    fn test_pseudo_identifier_ignores_non_content_fields() {
        let a = sample();
        let mut b = sample();
        b.active = true;
        b.modalities.insert("Cash");
        b.dates.start = Some("2021-01-01".into());
        assert_eq!(pseudo_identifier(&a), pseudo_identifier(&b));
    }

    #[test]
    fn test_pseudo_identifier_changes_with_content() {
        let a = sample();
        let mut b = sample();
        b.locations.admin2.insert("baidoa");
        assert_ne!(pseudo_identifier(&a), pseudo_identifier(&b));

        let mut c = sample();
        c.orgs.implementing = Default::default();
        c.orgs.funding.insert("wfp");
        assert_ne!(pseudo_identifier(&a), pseudo_identifier(&c));
    }

    #[test]
    fn test_normalise_date_formats() {
        assert_eq!(normalise_date(Some("2021-03-05")), Some("2021-03-05".into()));
        assert_eq!(normalise_date(Some(" 5/3/2021 ")), Some("2021-03-05".into()));
        assert_eq!(normalise_date(Some("2021/03/05")), Some("2021-03-05".into()));
        assert_eq!(normalise_date(Some("05-Mar-2021")), Some("2021-03-05".into()));
        assert_eq!(
            normalise_date(Some("2021-03-05T10:00:00Z")),
            Some("2021-03-05".into())
        );
    }

    #[test]
    fn test_normalise_date_keeps_unknown_text() {
        assert_eq!(normalise_date(Some("Q3  2021")), Some("Q3 2021".into()));
        assert_eq!(normalise_date(Some("  ")), None);
        assert_eq!(normalise_date(None), None);
    }
}
