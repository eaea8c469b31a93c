//! Entity trait - common interface for canonical organisations, locations and sectors

use serde::{de::DeserializeOwned, Serialize};

/// Common trait for all canonical entities resolved from reference tables
pub trait CanonicalEntity: Serialize + DeserializeOwned + Clone {
    /// Table name used in diagnostics (e.g. "organisation")
    const KIND: &'static str;

    /// Short, token-derived identifier, unique within the entity kind
    fn stub(&self) -> &str;

    /// Display name
    fn name(&self) -> &str;

    /// Alternate strings that resolve to this entity
    fn synonyms(&self) -> &[String];

    /// Excluded from every index and link
    fn skip(&self) -> bool;

    /// Synthesised on the fly because no reference entry matched
    fn unrecognised(&self) -> bool;

    /// The string an activity records for this entity
    ///
    /// Recognised entities are recorded by stub. Unrecognised ones have no
    /// durable identifier yet, so the display name is recorded and resolved
    /// again when activities are merged.
    fn reference(&self) -> &str {
        if self.unrecognised() {
            self.name()
        } else {
            self.stub()
        }
    }
}

pub(crate) fn is_false(b: &bool) -> bool {
    !*b
}
