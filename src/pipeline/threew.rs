//! 3W ("who does what where") spreadsheet ingestion
//!
//! Each HXL row becomes one humanitarian activity. Rows carry no natural
//! key, so the identifier is derived from the resolved content.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::core::context::ReferenceContext;
use crate::core::entity::CanonicalEntity;
use crate::core::identity::{normalise_date, pseudo_identifier};
use crate::core::reference::ReferenceError;
use crate::core::token::normalise;
use crate::entities::activity::{Activity, Beneficiary, Role, Source};
use crate::entities::sector::SectorType;
use crate::pipeline::hxl::{HxlReadError, HxlRow, HxlTable};
use crate::pipeline::PipelineError;

const ORG_COLUMNS: [(&str, Role); 3] = [
    ("#org+impl", Role::Implementing),
    ("#org+prog", Role::Programming),
    ("#org+funding", Role::Funding),
];

const TARGETED_COLUMNS: [(&str, Beneficiary); 6] = [
    ("#targeted+ind+all", Beneficiary::TotalIndividuals),
    ("#targeted+hh+all", Beneficiary::TotalHouseholds),
    ("#targeted+f+adults", Beneficiary::Women),
    ("#targeted+m+adults", Beneficiary::Men),
    ("#targeted+f+children", Beneficiary::Girls),
    ("#targeted+m+children", Beneficiary::Boys),
];

/// Parse a beneficiary count; anything that is not a whole number is dropped
pub fn parse_count(raw: Option<&str>) -> Option<u64> {
    normalise(raw)?.parse().ok()
}

/// Build one activity from a 3W row
pub fn make_activity(ctx: &mut ReferenceContext, row: &HxlRow<'_>) -> Result<Activity, ReferenceError> {
    let mut activity = Activity::new(String::new(), Source::ThreeW);
    activity.humanitarian = true;

    let project = row.get("#activity+project");
    activity.title = normalise(row.get("#activity+programme").or(project));
    activity.description = normalise(project);
    activity.active = row
        .get("#status")
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("ongoing"));
    activity.dates.start = normalise_date(row.get("#date+start"));
    activity.dates.end = normalise_date(row.get("#date+end"));

    for (column, role) in ORG_COLUMNS {
        let Some(name) = row.get(column) else {
            continue;
        };
        let Some(org) = ctx.resolve_org(name, true)? else {
            continue;
        };
        if org.skip {
            continue;
        }
        let reference = org.reference().to_string();
        // In the 3W the programming partner is the one reporting
        if role == Role::Programming && activity.reported_by.is_none() {
            activity.reported_by = Some(reference.clone());
        }
        activity.orgs.get_mut(role).insert(reference);
    }

    if let Some(cluster) = row.get("#sector") {
        if let Some(sector) = ctx.resolve_sector(cluster, SectorType::Humanitarian)? {
            if !sector.skip {
                activity.sectors.humanitarian.insert(sector.reference());
            }
        }
    }

    activity.locations = ctx.resolve_place(
        row.get("#adm1+name"),
        row.get("#adm2+name"),
        row.get("#loc+name"),
    )?;
    activity.locations.countries.insert(ctx.country());

    if let Some(modality) = normalise(row.get("#modality")) {
        activity.modalities.insert(modality);
    }

    for (column, category) in TARGETED_COLUMNS {
        if let Some(count) = parse_count(row.get(column)) {
            activity.targeted.insert(category, count);
        }
    }

    activity.identifier = pseudo_identifier(&activity);
    Ok(activity)
}

/// Read every activity from one 3W CSV file
pub fn read_threew(ctx: &mut ReferenceContext, path: &Path) -> Result<Vec<Activity>, PipelineError> {
    let file = File::open(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = HxlTable::from_reader(BufReader::new(file)).map_err(|e| match e {
        HxlReadError::NoHashtags => PipelineError::NoHashtags {
            path: path.to_path_buf(),
        },
        HxlReadError::Csv(e) => PipelineError::Csv {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })?;

    for (line, message) in table.bad_rows() {
        ctx.reporter()
            .error(format!("{} line {}: skipped unreadable row: {}", path.display(), line, message));
    }

    let mut activities = Vec::with_capacity(table.len());
    for row in table.rows() {
        activities.push(make_activity(ctx, &row)?);
    }
    ctx.reporter().detail(format!(
        "{}: {} activities",
        path.display(),
        activities.len()
    ));
    Ok(activities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::{build_location_table, build_org_table, build_sector_table};
    use crate::core::report::Reporter;
    use serde_json::json;

    const HEADER: &str = "\
Programme,Project,Status,Start,End,Implementing,Programming,Funding,Cluster,Region,District,Location,Modality,Individuals,Households,Women,Men,Girls,Boys
#activity+programme,#activity+project,#status,#date+start,#date+end,#org+impl,#org+prog,#org+funding,#sector,#adm1+name,#adm2+name,#loc+name,#modality,#targeted+ind+all,#targeted+hh+all,#targeted+f+adults,#targeted+m+adults,#targeted+f+children,#targeted+m+children
";

    fn context() -> ReferenceContext {
        let orgs = build_org_table(&json!({
            "SCI": { "name": "Save the Children International", "shortname": "SCI",
                     "scope": "international", "synonyms": ["Save the Children"] },
            "UNICEF": { "name": "UNICEF", "scope": "international" },
            "ECHO": { "name": "European Commission Humanitarian Aid", "shortname": "ECHO",
                      "scope": "international" },
            "N/A": { "name": "Not applicable", "skip": true }
        }))
        .unwrap();
        let locations = build_location_table(&json!({
            "admin1": {
                "Bay": { "name": "Bay", "admin2": {
                    "Baidoa": { "name": "Baidoa", "unclassified": {
                        "Isha": { "name": "Isha" } } } } }
            },
            "unclassified": {}
        }))
        .unwrap();
        let clusters = build_sector_table(
            &json!({ "WASH": { "name": "Water Sanitation Hygiene", "synonyms": ["Water, Sanitation and Hygiene"] } }),
            SectorType::Humanitarian,
        )
        .unwrap();
        ReferenceContext::detached(Reporter::silent())
            .with_orgs(orgs)
            .with_locations(locations)
            .with_clusters(clusters)
    }

    fn build(csv: &str) -> Vec<Activity> {
        let mut ctx = context();
        let table = HxlTable::from_reader(format!("{}{}", HEADER, csv).as_bytes()).unwrap();
        table.rows().map(|row| make_activity(&mut ctx, &row).unwrap()).collect()
    }

    #[test]
    fn test_full_row() {
        let activities = build(
            "Water for Bay,Trucking,Ongoing,01/02/2021,2021-12-31,Save the Children,UNICEF,ECHO,\"Water, Sanitation and Hygiene\",Bay,Baidoa,Isha,Cash,1200,200,400,300,250,250\n",
        );
        let a = &activities[0];
        assert_eq!(a.source, Source::ThreeW);
        assert!(a.humanitarian);
        assert!(a.active);
        assert_eq!(a.title.as_deref(), Some("Water for Bay"));
        assert_eq!(a.description.as_deref(), Some("Trucking"));
        assert_eq!(a.dates.start.as_deref(), Some("2021-02-01"));
        assert_eq!(a.dates.end.as_deref(), Some("2021-12-31"));
        assert_eq!(a.orgs.implementing.as_slice(), &["sci".to_string()]);
        assert_eq!(a.orgs.programming.as_slice(), &["unicef".to_string()]);
        assert_eq!(a.orgs.funding.as_slice(), &["echo".to_string()]);
        assert_eq!(a.reported_by.as_deref(), Some("unicef"));
        assert_eq!(a.sectors.humanitarian.as_slice(), &["wash".to_string()]);
        assert!(a.sectors.dac.is_empty());
        assert_eq!(a.locations.admin1.as_slice(), &["bay".to_string()]);
        assert_eq!(a.locations.admin2.as_slice(), &["baidoa".to_string()]);
        assert_eq!(a.locations.unclassified.as_slice(), &["isha".to_string()]);
        assert_eq!(a.locations.countries.as_slice(), &["SO".to_string()]);
        assert_eq!(a.modalities.as_slice(), &["Cash".to_string()]);
        assert_eq!(a.targeted[&Beneficiary::TotalIndividuals], 1200);
        assert_eq!(a.targeted[&Beneficiary::Boys], 250);
        assert_eq!(a.identifier.len(), 16);
    }

    #[test]
    fn test_title_falls_back_to_project() {
        let activities = build(",Borehole repair,Completed,,,UNICEF,,,,,,,,,,,,,\n");
        let a = &activities[0];
        assert_eq!(a.title.as_deref(), Some("Borehole repair"));
        assert!(!a.active);
        assert!(a.reported_by.is_none());
    }

    #[test]
    fn test_non_numeric_counts_omitted() {
        let activities = build("P,Q,,,,UNICEF,,,,,,,,N/A,,  12 ,-3,1.5,\n");
        let targeted = &activities[0].targeted;
        assert_eq!(targeted.len(), 1);
        assert_eq!(targeted[&Beneficiary::Women], 12);
        assert!(!targeted.contains_key(&Beneficiary::TotalIndividuals));
    }

    #[test]
    fn test_unrecognised_and_skipped_orgs() {
        let activities = build("P,Q,,,,Somali Youth Development Network,Not applicable,,,,,,,,,,,,\n");
        let a = &activities[0];
        assert_eq!(
            a.orgs.implementing.as_slice(),
            &["Somali Youth Development Network".to_string()]
        );
        assert!(a.orgs.programming.is_empty());
        assert!(a.reported_by.is_none());
    }

    #[test]
    fn test_same_content_same_identifier() {
        let row = "P,Q,Ongoing,,,UNICEF,,,WASH,Bay,,,,,,,,,\n";
        let activities = build(&format!("{}{}", row, row));
        assert_eq!(activities[0].identifier, activities[1].identifier);

        let other = build("P,Q,Ongoing,,,UNICEF,,,WASH,Bay,Baidoa,,,,,,,,\n");
        assert_ne!(activities[0].identifier, other[0].identifier);
    }

    #[test]
    fn test_read_threew_without_hashtags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("3w.csv");
        std::fs::write(&path, "Org,Region\nUNICEF,Bay\n").unwrap();
        let mut ctx = context();
        assert!(matches!(
            read_threew(&mut ctx, &path),
            Err(PipelineError::NoHashtags { .. })
        ));
    }
}
