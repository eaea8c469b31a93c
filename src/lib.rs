//! Aidmap: humanitarian activity mapping
//!
//! Turns HXL-tagged 3W spreadsheets and IATI activity records into one
//! catalog of activities whose organisations, sectors and locations are
//! resolved against curated reference tables, then aggregates the catalog
//! into organisation, sector and location indexes and an organisation
//! network.
//!
//! Stages are plain functions over a [`core::ReferenceContext`], which owns
//! the loaded reference tables for one run.

pub mod cli;
pub mod core;
pub mod entities;
pub mod index;
pub mod json;
pub mod pipeline;
