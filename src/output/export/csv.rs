//! CSV export of power evolutions
//!
//! One row per mesh node: the position, every channel power and the upper
//! level fraction. The file opens in Excel, pandas or MATLAB.
//!
//! # Quick Examples
//!
//! ## Minimal Export
//!
//! ```rust,ignore
//! use fiberamp::output::export::export_power_evolution_csv;
//!
//! export_power_evolution_csv(&result, "amplifier.csv", None)?;
//! ```
//!
//! **Output** (`amplifier.csv`):
//! ```csv
//! z (m),signal[0] 1030.0 nm (W),counter_pump[0] 976.0 nm (W),upper level fraction
//! 0.000000e0,1.000000e-1,3.561372e-1,3.130297e-2
//! ...
//! ```
//!
//! ## With Metadata
//!
//! ```rust,ignore
//! let config = CsvConfig::default().with_metadata(CsvMetadata::from_result(&result));
//! export_power_evolution_csv(&result, "amplifier.csv", Some(&config))?;
//! ```
//!
//! **Output**:
//! ```csv
//! # Fiber Amplifier Simulation Data
//! # Model: Giles
//! # Solver: Lobatto IIIA collocation
//! # Nodes: 187
//! # Newton Iterations: 14
//! #
//! z (m),...
//! ```

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{FiberAmpError, FiberAmpResult};
use crate::simulation::SimulationResult;

// =============================================================================
// Configuration Structures
// =============================================================================

/// Configuration for CSV export
///
/// # Example
///
/// ```rust
/// use fiberamp::output::export::CsvConfig;
///
/// let config = CsvConfig {
///     delimiter: b';',
///     precision: 10,
///     ..Default::default()
/// };
/// assert!(!config.include_metadata);
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: b',')
    pub delimiter: u8,

    /// Decimal separator (default: '.')
    pub decimal_separator: char,

    /// Digits after the point in scientific notation (default: 6)
    pub precision: usize,

    /// Include `#` header comments (default: false)
    pub include_metadata: bool,

    pub metadata: Option<CsvMetadata>,

    /// Append the upper level fraction column (default: true)
    pub include_upper_level_fraction: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            decimal_separator: '.',
            precision: 6,
            include_metadata: false,
            metadata: None,
            include_upper_level_fraction: true,
        }
    }
}

impl CsvConfig {
    /// Semicolon-separated with a decimal comma
    pub fn european() -> Self {
        Self {
            delimiter: b';',
            decimal_separator: ',',
            ..Default::default()
        }
    }

    pub fn high_precision() -> Self {
        Self {
            precision: 12,
            ..Default::default()
        }
    }

    /// Builder pattern: set delimiter
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder pattern: set precision
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Builder pattern: enable metadata
    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }
}

/// Metadata for CSV header comments
///
/// Only the fields that are set end up in the header.
#[derive(Debug, Clone, Default)]
pub struct CsvMetadata {
    pub model_name: Option<String>,

    pub solver_name: Option<String>,

    /// Nodes of the final mesh
    pub nodes: Option<usize>,

    pub newton_iterations: Option<usize>,

    /// Largest relative collocation residual
    pub max_residual: Option<f64>,

    /// Additional custom parameters
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    /// Everything the result knows about how it was computed
    pub fn from_result(result: &SimulationResult) -> Self {
        Self {
            model_name: Some(result.model_name().to_string()),
            solver_name: Some(result.solver_name().to_string()),
            nodes: Some(result.nodes()),
            newton_iterations: Some(result.solver_iterations()),
            max_residual: Some(result.max_residual()),
            custom: Vec::new(),
        }
    }

    /// Add custom parameter
    pub fn add_custom(&mut self, key: impl Into<String>, value: impl ToString) {
        self.custom.push((key.into(), value.to_string()));
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn write_metadata_header(file: &mut File, metadata: &CsvMetadata) -> FiberAmpResult<()> {
    writeln!(file, "# Fiber Amplifier Simulation Data")?;

    if let Some(model) = &metadata.model_name {
        writeln!(file, "# Model: {}", model)?;
    }
    if let Some(solver) = &metadata.solver_name {
        writeln!(file, "# Solver: {}", solver)?;
    }
    if let Some(nodes) = metadata.nodes {
        writeln!(file, "# Nodes: {}", nodes)?;
    }
    if let Some(iterations) = metadata.newton_iterations {
        writeln!(file, "# Newton Iterations: {}", iterations)?;
    }
    if let Some(residual) = metadata.max_residual {
        writeln!(file, "# Max Residual: {:e}", residual)?;
    }

    for (key, value) in &metadata.custom {
        writeln!(file, "# {}: {}", key, value)?;
    }

    // Separator
    writeln!(file, "#")?;

    Ok(())
}

/// Scientific notation with the configured precision and decimal separator
fn format_number(value: f64, config: &CsvConfig) -> String {
    let formatted = format!("{:.prec$e}", value, prec = config.precision);

    if config.decimal_separator != '.' {
        formatted.replace('.', &config.decimal_separator.to_string())
    } else {
        formatted
    }
}

/// Column headers: position, one per channel, optional upper level fraction
fn column_headers(result: &SimulationResult, config: &CsvConfig) -> Vec<String> {
    let mut headers = vec!["z (m)".to_string()];
    for (category, range) in result.slices().iter() {
        for (k, row) in range.enumerate() {
            headers.push(format!(
                "{}[{}] {:.1} nm (W)",
                category.label(),
                k,
                result.wavelengths()[row] * 1e9
            ));
        }
    }
    if config.include_upper_level_fraction {
        headers.push("upper level fraction".to_string());
    }
    headers
}

// =============================================================================
// Export Functions
// =============================================================================

/// Export the power of every channel along the fiber
///
/// # Errors
///
/// - `ShapeMismatch` when the result rows and wavelengths disagree
/// - `NonFinite` when a power is NaN or Inf
/// - `Io` / `Csv` on write failures
///
/// # Example
///
/// ```rust,ignore
/// export_power_evolution_csv(&result, "amplifier.csv", None)?;
/// ```
pub fn export_power_evolution_csv(
    result: &SimulationResult,
    output_path: impl AsRef<Path>,
    configuration: Option<&CsvConfig>,
) -> FiberAmpResult<()> {
    // ============================= Validation =============================

    let powers = result.powers();
    if powers.nrows() != result.wavelengths().len() {
        return Err(FiberAmpError::shape(
            "exported wavelengths",
            powers.nrows(),
            result.wavelengths().len(),
        ));
    }
    if let Some(index) = powers.iter().position(|p| !p.is_finite()) {
        return Err(FiberAmpError::NonFinite {
            what: "exported powers".to_string(),
            index,
        });
    }

    // ============================= Configuration ==========================

    let binding = CsvConfig::default();
    let configuration = configuration.unwrap_or(&binding);

    // ============================= Open File ==============================

    let mut file = File::create(output_path.as_ref())?;

    // ============================= Write Metadata =========================

    if configuration.include_metadata {
        if let Some(metadata) = &configuration.metadata {
            write_metadata_header(&mut file, metadata)?;
        }
    }

    // ============================= Write Data =============================

    let mut writer = csv::WriterBuilder::new()
        .delimiter(configuration.delimiter)
        .from_writer(file);

    writer.write_record(column_headers(result, configuration))?;

    for (j, z) in result.z().iter().enumerate() {
        let mut record = Vec::with_capacity(powers.nrows() + 2);
        record.push(format_number(*z, configuration));
        record.extend(powers.column(j).iter().map(|p| format_number(*p, configuration)));
        if configuration.include_upper_level_fraction {
            record.push(format_number(result.upper_level_fraction()[j], configuration));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
