//! Token-keyed lookup table
//!
//! Records are stored once; any number of tokens may point at the same
//! record. A token is claimed by the first record registered under it and
//! never reassigned.

use std::collections::HashMap;

use crate::core::entity::CanonicalEntity;
use crate::core::token::tokenize;

/// A flat mapping from lookup token to canonical record
#[derive(Debug, Clone)]
pub struct LookupTable<T> {
    records: Vec<T>,
    tokens: HashMap<String, usize>,
}

impl<T> Default for LookupTable<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            tokens: HashMap::new(),
        }
    }
}

impl<T: CanonicalEntity> LookupTable<T> {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record without registering any tokens, returning its slot
    pub fn push(&mut self, record: T) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    /// Register `text` (tokenized) for the record in `slot`
    ///
    /// Returns false if the token is blank or already claimed.
    pub fn register(&mut self, text: &str, slot: usize) -> bool {
        let token = tokenize(text);
        if token.is_empty() || self.tokens.contains_key(&token) {
            return false;
        }
        self.tokens.insert(token, slot);
        true
    }

    /// Store a record whose stub token must be its own
    ///
    /// The stub is registered before any other alias so that looking a stub
    /// up again always returns the record that carries it. Hands the record
    /// back if the stub is blank or its token is already claimed.
    pub fn claim(&mut self, record: T) -> Result<usize, T> {
        let token = tokenize(record.stub());
        if token.is_empty() || self.tokens.contains_key(&token) {
            return Err(record);
        }
        let slot = self.push(record);
        self.tokens.insert(token, slot);
        Ok(slot)
    }

    /// Store a record and register its stub and name
    pub fn insert(&mut self, record: T) -> usize {
        let stub = record.stub().to_string();
        let name = record.name().to_string();
        let slot = self.push(record);
        self.register(&stub, slot);
        self.register(&name, slot);
        slot
    }

    /// Look up a free-text name
    pub fn get(&self, name: &str) -> Option<&T> {
        self.get_token(&tokenize(name))
    }

    /// Look up an already-tokenized key
    pub fn get_token(&self, token: &str) -> Option<&T> {
        self.tokens.get(token).map(|&slot| &self.records[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tokens.contains_key(&tokenize(name))
    }

    /// Find a record by its stub
    pub fn by_stub(&self, stub: &str) -> Option<&T> {
        self.get_token(&tokenize(stub))
            .filter(|r| r.stub() == stub)
            .or_else(|| self.records.iter().find(|r| r.stub() == stub))
    }

    /// Distinct records, in registration order
    pub fn records(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }

    /// Number of distinct records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
