//! Entity resolution: free-text names to canonical records
//!
//! Resolution is permissive. A name with no reference match yields a
//! provisional record (flagged `unrecognised`) instead of an error, and that
//! record is cached so the same name resolves identically for the rest of
//! the run. Only a missing or malformed reference table is an error.

use crate::core::context::ReferenceContext;
use crate::core::entity::CanonicalEntity;
use crate::core::reference::ReferenceError;
use crate::core::token::{normalise_str, tokenize};
use crate::entities::activity::LocationMap;
use crate::entities::location::{Level, Location};
use crate::entities::organisation::Organisation;
use crate::entities::sector::{Sector, SectorType};

impl ReferenceContext {
    /// Resolve an organisation name
    ///
    /// Blocklisted names resolve to nothing. Unmatched names yield a
    /// provisional record when `create` is true, otherwise nothing.
    pub fn resolve_org(
        &mut self,
        name: &str,
        create: bool,
    ) -> Result<Option<Organisation>, ReferenceError> {
        let Some(normalised) = normalise_str(name) else {
            return Ok(None);
        };
        if self.is_blocked(&normalised) {
            self.reporter().detail(format!("Blocked organisation: {}", normalised));
            return Ok(None);
        }
        let token = tokenize(&normalised);
        if token.is_empty() {
            return Ok(None);
        }

        if let Some(org) = self.orgs()?.get_token(&token) {
            if org.unrecognised && !create {
                return Ok(None);
            }
            return Ok(Some(org.clone()));
        }

        if !create {
            return Ok(None);
        }
        self.note_unrecognised("organisation", &token, &normalised);

        let org = Organisation::provisional(token.clone(), normalised);
        let table = self.orgs()?;
        let slot = table.push(org.clone());
        table.register(&token, slot);
        Ok(Some(org))
    }

    /// Resolve a location name, synthesising an unclassified place if needed
    ///
    /// `hint` is the level the source claims for the name. A disagreement is
    /// reported but the resolved level is kept.
    pub fn resolve_location(
        &mut self,
        name: &str,
        hint: Level,
    ) -> Result<Option<Location>, ReferenceError> {
        let Some(normalised) = normalise_str(name) else {
            return Ok(None);
        };
        let token = tokenize(&normalised);
        if token.is_empty() {
            return Ok(None);
        }

        if let Some(location) = self.locations()?.get_token(&token) {
            let location = location.clone();
            if hint != Level::Unclassified && hint != location.level && !location.unrecognised {
                self.reporter().detail(format!(
                    "Level mismatch for {}: stated {}, reference says {}",
                    normalised, hint, location.level
                ));
            }
            return Ok(Some(location));
        }

        self.note_unrecognised("location", &token, &normalised);
        let location = Location::provisional(token.clone(), normalised);
        let table = self.locations()?;
        let slot = table.push(location.clone());
        table.register(&token, slot);
        Ok(Some(location))
    }

    /// Look up a sector without synthesising anything
    pub fn find_sector(
        &mut self,
        name: &str,
        sector_type: SectorType,
    ) -> Result<Option<Sector>, ReferenceError> {
        let token = tokenize(name);
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self.sectors(sector_type)?.get_token(&token).cloned())
    }

    /// Resolve a sector code or label, falling back to a free-text label
    pub fn resolve_sector(
        &mut self,
        name: &str,
        sector_type: SectorType,
    ) -> Result<Option<Sector>, ReferenceError> {
        let Some(normalised) = normalise_str(name) else {
            return Ok(None);
        };
        let token = tokenize(&normalised);
        if token.is_empty() {
            return Ok(None);
        }

        if let Some(sector) = self.sectors(sector_type)?.get_token(&token) {
            return Ok(Some(sector.clone()));
        }

        self.note_unrecognised(sector_type.as_str(), &token, &normalised);
        let sector = Sector::provisional(token.clone(), normalised, sector_type);
        let table = self.sectors(sector_type)?;
        let slot = table.push(sector.clone());
        table.register(&token, slot);
        Ok(Some(sector))
    }

    /// Resolve an organisation reference stored on an activity
    ///
    /// Merged activities carry stubs, so an exact stub match comes first;
    /// anything else (a name deferred by a builder) goes through
    /// [`ReferenceContext::resolve_org`].
    pub fn canonical_org(&mut self, reference: &str) -> Result<Option<Organisation>, ReferenceError> {
        if self.is_blocked(reference) {
            return Ok(None);
        }
        let found = self.orgs()?.by_stub(reference).cloned();
        if found.is_some() {
            return Ok(found);
        }
        self.resolve_org(reference, true)
    }

    /// Resolve a location reference stored on an activity, stub first
    pub fn canonical_location(
        &mut self,
        reference: &str,
        level: Level,
    ) -> Result<Option<Location>, ReferenceError> {
        let found = self.locations()?.by_stub(reference).cloned();
        if found.is_some() {
            return Ok(found);
        }
        self.resolve_location(reference, level)
    }

    /// Resolve a sector reference stored on an activity, stub first
    pub fn canonical_sector(
        &mut self,
        reference: &str,
        sector_type: SectorType,
    ) -> Result<Option<Sector>, ReferenceError> {
        let found = self.sectors(sector_type)?.by_stub(reference).cloned();
        if found.is_some() {
            return Ok(found);
        }
        self.resolve_sector(reference, sector_type)
    }

    /// The humanitarian cluster a DAC sector maps to, if any
    pub fn cluster_for_dac(&mut self, dac: &Sector) -> Result<Option<Sector>, ReferenceError> {
        match dac.humanitarian.as_deref() {
            Some(cluster) => self.resolve_sector(cluster, SectorType::Humanitarian),
            None => Ok(None),
        }
    }

    /// Resolve the three location columns of one spreadsheet row
    ///
    /// Applies hierarchy repair: a district overrides a conflicting region,
    /// and a place without its own district inherits the row's district.
    pub fn resolve_place(
        &mut self,
        admin1: Option<&str>,
        admin2: Option<&str>,
        place: Option<&str>,
    ) -> Result<LocationMap, ReferenceError> {
        let mut found = Vec::new();
        for (name, hint) in [
            (admin1, Level::Admin1),
            (admin2, Level::Admin2),
            (place, Level::Unclassified),
        ] {
            if let Some(name) = name {
                if let Some(location) = self.resolve_location(name, hint)? {
                    if !location.skip {
                        found.push(location);
                    }
                }
            }
        }
        Ok(self.place_locations(&found, true))
    }

    /// File resolved locations by level together with their ancestors
    ///
    /// With `repair`, the locations are treated as one row describing a
    /// single place (see [`ReferenceContext::resolve_place`]). Without it they
    /// are independent mentions and only their own ancestor chains are added.
    pub fn place_locations(&self, found: &[Location], repair: bool) -> LocationMap {
        let mut result = LocationMap::default();
        let regions: Vec<&Location> = found.iter().filter(|l| l.level == Level::Admin1).collect();
        let districts: Vec<&Location> = found.iter().filter(|l| l.level == Level::Admin2).collect();
        let places: Vec<&Location> = found
            .iter()
            .filter(|l| l.level == Level::Unclassified)
            .collect();
        let row_district = if repair { districts.first().copied() } else { None };
        let row_region = if repair { regions.first().copied() } else { None };

        for district in &districts {
            result.admin2.insert(district.reference());
            if let Some(ref region) = district.admin1 {
                result.admin1.insert(region.clone());
            }
        }

        for place in &places {
            result.unclassified.insert(place.reference());

            let inherited = match place.admin2 {
                Some(_) => None,
                None => row_district
                    .filter(|d| place.admin1.is_none() || d.admin1 == place.admin1),
            };
            if let Some(ref district) = place.admin2 {
                result.admin2.insert(district.clone());
            } else if let Some(district) = inherited {
                result.admin2.insert(district.reference());
            }

            let region = place
                .admin1
                .clone()
                .or_else(|| inherited.and_then(|d| d.admin1.clone()))
                .or_else(|| row_region.map(|r| r.reference().to_string()));
            if let Some(region) = region {
                result.admin1.insert(region);
            }
        }

        // Regions implied by more specific locations win over stated ones
        let implied = result.admin1.clone();
        for region in &regions {
            let reference = region.reference();
            if repair && !implied.is_empty() && !implied.contains(reference) {
                self.reporter().detail(format!(
                    "Region {} conflicts with district/place hierarchy ({}); keeping the district's region",
                    region.name,
                    implied.as_slice().join(", ")
                ));
                continue;
            }
            result.admin1.insert(reference);
        }

        result
    }
}
