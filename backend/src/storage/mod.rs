//! # Storage Module
//!
//! File based persistence: YAML documents for profiles, settings and indexes,
//! CSV for the per-baby activity logs.

pub mod csv;
pub mod traits;

pub use csv::CsvConnection;
pub use traits::*;
