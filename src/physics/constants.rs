//! Physical and numerical constants
//!
//! All constants are in SI units.

/// Planck constant h \[J·s\]
pub const PLANCK_CONSTANT: f64 = 6.626_070_15e-34;

/// Speed of light in vacuum c \[m/s\]
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Smallest power carried by any channel \[W\]
///
/// Powers are clamped to this floor before entering the rate equations, and
/// zero input powers (ASE and Raman seeds) are raised to it when a channel is
/// created.
pub const SIMULATION_MIN_POWER: f64 = 1e-18;

/// Number of polarization modes feeding spontaneous emission into a
/// finite-bandwidth channel.
pub const NUMBER_OF_ASE_POLARIZATION_MODES: f64 = 2.0;

/// Stokes shift of the silica Raman gain peak \[Hz\]
pub const RAMAN_FREQUENCY_SHIFT: f64 = 13.2e12;

/// Peak Raman gain coefficient of fused silica g_R \[m/W\]
pub const RAMAN_GAIN: f64 = 1e-13;

/// Width of the simulated Raman band \[Hz\]
pub const RAMAN_GAIN_BANDWIDTH: f64 = 6e12;

/// Default mesh-node budget of the boundary-value solver
pub const SOLVER_MAX_NODES: usize = 100_000;
