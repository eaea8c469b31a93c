//! Entity type definitions
//!
//! **Canonical entities** (resolved from reference tables):
//! - [`Organisation`] - agencies and NGOs, classified by scope
//! - [`Location`] - regions, districts and unclassified places
//! - [`Sector`] - DAC purpose codes and humanitarian clusters
//!
//! **Activities:**
//! - [`Activity`] - one unit of work from the 3W survey or the IATI feed

pub mod activity;
pub mod location;
pub mod organisation;
pub mod sector;

pub use activity::{Activity, Role, Source};
pub use location::{Level, Location};
pub use organisation::{Organisation, Scope};
pub use sector::{Sector, SectorType};
