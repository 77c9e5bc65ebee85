//! Catalog loading and lookup for Commandeer.
//!
//! Resources are declared in YAML files, one resource per file, dropped into
//! a configuration directory. This crate reads that directory once at
//! startup, validates the dependency declarations, and exposes the immutable
//! in-memory catalog the rest of the application navigates.

mod catalog;
mod error;

pub use catalog::{Catalog, default_config_dir};
pub use error::RegistryError;
