//! Core module - normalisation, reference data and entity resolution

pub mod config;
pub mod context;
pub mod entity;
pub mod identity;
pub mod lookup;
pub mod reference;
pub mod report;
pub mod resolver;
pub mod token;

pub use config::{Config, ConfigError};
pub use context::ReferenceContext;
pub use entity::CanonicalEntity;
pub use lookup::LookupTable;
pub use reference::ReferenceError;
pub use report::Reporter;
