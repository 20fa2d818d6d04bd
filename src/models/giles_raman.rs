//! Giles model with stimulated Raman scattering
//!
//! Adds Raman coupling between the signals and the Raman Stokes channels on
//! top of [`GilesModel`]. With γ = g_R / A_eff the Raman gain efficiency and
//! kₛ the peak-to-average power ratio of signal s:
//!
//! ```text
//! dP_r/dz += u_r·γ·(Σₛ kₛ·Pₛ)·(P_r + hν_r·Δν_r)
//! dPₛ/dz  −= uₛ·γ·kₛ·Pₛ·Σ_r (νₛ/ν_r)·(P_r + hν_r·Δν_r)
//! ```
//!
//! The hν·Δν term seeds spontaneous Raman scattering, and the νₛ/ν_r factor
//! conserves photon number: every Stokes photon costs one signal photon.

use std::ops::Range;

use nalgebra::{DMatrix, DVector};

use crate::channels::{ChannelCategory, Channels};
use crate::error::{FiberAmpError, FiberAmpResult};
use crate::models::giles::{floor_powers, GilesModel};
use crate::physics::constants::RAMAN_GAIN;
use crate::physics::conversions::photon_energy;
use crate::physics::RateEquationModel;

/// Giles model plus Raman coupling
#[derive(Debug, Clone)]
pub struct GilesModelWithRaman {
    giles: GilesModel,

    // ==================== Raman ====================
    /// Raman gain efficiency γ \[1/(W·m)\]
    raman_efficiency: f64,
    signals: Range<usize>,
    /// Forward and backward Raman rows
    raman: Vec<usize>,
    frequency: DVector<f64>,
    direction: DVector<f64>,
    /// Spontaneous Raman seed hν·Δν \[W\]
    spontaneous: DVector<f64>,
    /// Peak-to-average power ratio of every channel
    peak_power_ratio: DVector<f64>,
}

impl GilesModelWithRaman {
    /// Build the model; the effective area is taken at the first signal
    pub fn new(channels: &Channels) -> FiberAmpResult<Self> {
        let giles = GilesModel::new(channels)?;
        let slices = channels.get_slices();
        let n = channels.total_count();

        let raman: Vec<usize> = slices
            .slice(ChannelCategory::ForwardRaman)
            .chain(slices.slice(ChannelCategory::BackwardRaman))
            .collect();

        let raman_efficiency = match channels.category(ChannelCategory::Signal).first() {
            Some(signal) => {
                let area = channels.fiber().nonlinear_effective_area(signal.frequency())?;
                if area <= 0.0 || !area.is_finite() {
                    return Err(FiberAmpError::invalid(format!(
                        "nonlinear effective area must be positive, got {}",
                        area
                    )));
                }
                RAMAN_GAIN / area
            }
            None if raman.is_empty() => 0.0,
            None => {
                return Err(FiberAmpError::invalid("Raman channels need at least one signal"));
            }
        };

        Ok(Self {
            giles,
            raman_efficiency,
            signals: slices.slice(ChannelCategory::Signal),
            raman,
            frequency: DVector::from_iterator(n, channels.iter().map(|c| c.frequency())),
            direction: DVector::from_iterator(n, channels.iter().map(|c| c.direction().sign())),
            spontaneous: DVector::from_iterator(
                n,
                channels
                    .iter()
                    .map(|c| photon_energy(c.frequency()) * c.frequency_bandwidth()),
            ),
            peak_power_ratio: DVector::from_iterator(n, channels.iter().map(|c| c.peak_power_ratio())),
        })
    }

    /// Raman gain efficiency γ = g_R / A_eff \[1/(W·m)\]
    pub fn raman_efficiency(&self) -> f64 {
        self.raman_efficiency
    }

    fn add_raman_coupling(&self, floored: &DMatrix<f64>, derivative: &mut DMatrix<f64>) {
        if self.raman.is_empty() || self.signals.is_empty() {
            return;
        }
        let gamma = self.raman_efficiency;

        for j in 0..floored.ncols() {
            let pumping: f64 = self
                .signals
                .clone()
                .map(|s| self.peak_power_ratio[s] * floored[(s, j)])
                .sum();

            for &r in &self.raman {
                let stokes = floored[(r, j)] + self.spontaneous[r];
                derivative[(r, j)] += self.direction[r] * gamma * pumping * stokes;
            }

            for s in self.signals.clone() {
                let depletion: f64 = self
                    .raman
                    .iter()
                    .map(|&r| self.frequency[s] / self.frequency[r] * (floored[(r, j)] + self.spontaneous[r]))
                    .sum();
                derivative[(s, j)] -=
                    self.direction[s] * gamma * self.peak_power_ratio[s] * floored[(s, j)] * depletion;
            }
        }
    }
}

impl RateEquationModel for GilesModelWithRaman {
    fn dimension(&self) -> usize {
        self.giles.dimension()
    }

    fn derivative(&self, _z: &DVector<f64>, powers: &DMatrix<f64>) -> DMatrix<f64> {
        let floored = floor_powers(powers);
        let mut derivative = self.giles.derivative_floored(&floored);
        self.add_raman_coupling(&floored, &mut derivative);
        derivative
    }

    fn upper_level_fraction(&self, powers: &DMatrix<f64>) -> DVector<f64> {
        self.giles.upper_level_fraction(powers)
    }

    fn name(&self) -> &str {
        "Giles with Raman"
    }
}

// =================================================================================================
// Tests
// =================================================================================================
