//! Output of simulation results
//!
//! # Architecture
//!
//! ```text
//! output/
//! ├── mod.rs              ← This file
//! └── export/             ← Data export
//!     ├── mod.rs
//!     └── csv.rs
//! ```
//!
//! Plotting is left to external tools: the CSV files carry the position,
//! every channel power and the upper level fraction.

pub mod export;

pub use export::{export_power_evolution_csv, CsvConfig, CsvMetadata};
