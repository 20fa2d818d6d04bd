//! Fiber collaborators
//!
//! The rate-equation core never looks at spectroscopic data directly. It only
//! asks a [`Fiber`] for per-channel quantities: gain and absorption
//! coefficients (cross-section × overlap × dopant density), the mode field
//! diameter, the saturation parameter and the nonlinear effective area.
//!
//! Two implementations are provided:
//!
//! - [`ActiveFiber`]: rare-earth-doped fiber with tabulated cross sections
//! - [`PassiveFiber`]: undoped fiber, background loss only
//!
//! Any other fiber description (e.g. a double-clad fiber with a different
//! overlap model) only needs to implement the trait.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FiberAmpError, FiberAmpResult};

mod active;
mod passive;
mod spectrum;

pub use active::ActiveFiber;
pub use passive::PassiveFiber;
pub use spectrum::CrossSectionSpectrum;

// =================================================================================================
// Fiber Trait
// =================================================================================================

/// Per-channel physical parameters supplied by a fiber
///
/// Radii, diameters and lengths are in meters, frequencies in hertz, gain,
/// absorption and loss coefficients in 1/m.
pub trait Fiber: Send + Sync + fmt::Debug {
    /// Fiber length L \[m\]
    fn length(&self) -> f64;

    /// Background (scattering) loss \[1/m\]
    fn background_loss(&self) -> f64;

    /// True when the fiber has no gain medium
    fn is_passive_fiber(&self) -> bool;

    /// Gain coefficient g = σₑ·Γ·n_t at a single frequency \[1/m\]
    fn channel_gain(&self, frequency: f64, mode_field_radius: f64) -> f64;

    /// Absorption coefficient α = σₐ·Γ·n_t at a single frequency \[1/m\]
    fn channel_absorption(&self, frequency: f64, mode_field_radius: f64) -> f64;

    /// Mode field diameter: `preset_mfd` when positive, otherwise a value
    /// derived from the waveguide parameters
    fn mode_field_diameter(&self, frequency: f64, preset_mfd: f64) -> f64;

    /// Saturation parameter ζ = π·b²·n_t/τ \[1/(m·s)\]
    fn saturation_parameter(&self) -> f64;

    /// Effective area used for nonlinear (Raman) interactions \[m²\]
    fn nonlinear_effective_area(&self, frequency: f64) -> FiberAmpResult<f64>;

    /// Gain of a channel of finite bandwidth: mean of the band edge values
    fn finite_bandwidth_gain(&self, center_frequency: f64, frequency_bandwidth: f64, mode_field_radius: f64) -> f64 {
        let start = self.channel_gain(center_frequency - frequency_bandwidth / 2.0, mode_field_radius);
        let end = self.channel_gain(center_frequency + frequency_bandwidth / 2.0, mode_field_radius);
        0.5 * (start + end)
    }

    /// Absorption of a channel of finite bandwidth: mean of the band edge values
    fn finite_bandwidth_absorption(&self, center_frequency: f64, frequency_bandwidth: f64, mode_field_radius: f64) -> f64 {
        let start = self.channel_absorption(center_frequency - frequency_bandwidth / 2.0, mode_field_radius);
        let end = self.channel_absorption(center_frequency + frequency_bandwidth / 2.0, mode_field_radius);
        0.5 * (start + end)
    }
}

// =================================================================================================
// Effective Area
// =================================================================================================

/// How the nonlinear effective area is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectiveAreaType {
    /// Geometric core area π·a²
    #[default]
    CoreArea,

    /// π·w² with the Petermann II mode radius
    Gaussian,

    /// Exact LP01 Bessel field distribution (not available)
    Bessel,
}

impl EffectiveAreaType {
    /// Fails fast for modes without an implementation
    pub fn ensure_implemented(self) -> FiberAmpResult<()> {
        match self {
            EffectiveAreaType::CoreArea | EffectiveAreaType::Gaussian => Ok(()),
            EffectiveAreaType::Bessel => Err(FiberAmpError::NotImplemented(
                "effective area from the Bessel mode distribution".to_string(),
            )),
        }
    }
}

impl fmt::Display for EffectiveAreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectiveAreaType::CoreArea => write!(f, "core_area"),
            EffectiveAreaType::Gaussian => write!(f, "gaussian"),
            EffectiveAreaType::Bessel => write!(f, "bessel"),
        }
    }
}

// =================================================================================================
// Overlap
// =================================================================================================

/// Overlap Γ between a guided mode and the doped region
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlap {
    /// Gaussian mode overlap with the doped core, from the mode field radius
    #[default]
    Automatic,

    /// Same overlap for every channel (e.g. cladding pumping)
    Constant(f64),
}

// =================================================================================================
// Tests
// =================================================================================================
