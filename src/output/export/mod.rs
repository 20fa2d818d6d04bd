//! Export of simulation results
//!
//! # Available formats
//!
//! | Format  | Module   |
//! |---------|----------|
//! | CSV     | [`csv`]  |
//!
//! # Usage example
//!
//! ```rust,ignore
//! use fiberamp::output::export::{export_power_evolution_csv, CsvConfig, CsvMetadata};
//!
//! // Full export with a metadata header
//! let config = CsvConfig::default().with_metadata(CsvMetadata::from_result(&result));
//! export_power_evolution_csv(&result, "amplifier.csv", Some(&config))?;
//! ```

pub mod csv;

pub use self::csv::{export_power_evolution_csv, CsvConfig, CsvMetadata};
