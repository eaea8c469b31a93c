//! CLI command implementations
//!
//! One module per pipeline stage. Every stage writes a single JSON document
//! to stdout and reports counts on stderr.

pub mod completions;
pub mod iati;
pub mod index;
pub mod merge;
pub mod network;
pub mod run;
pub mod stats;
pub mod threew;
