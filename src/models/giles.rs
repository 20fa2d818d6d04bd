//! Giles rate-equation model
//!
//! Steady-state two-level model of a doped fiber. At every position the
//! fractional upper level population follows from the local channel powers:
//!
//! ```text
//!        Σᵢ Pᵢ·αᵢ / (hνᵢ·ζ)
//! n₂ = ─────────────────────────────
//!      1 + Σᵢ Pᵢ·(αᵢ + gᵢ) / (hνᵢ·ζ)
//! ```
//!
//! and every channel evolves as
//!
//! ```text
//! dPᵢ/dz = uᵢ·((αᵢ + gᵢ)·n₂ − αᵢ − lᵢ)·Pᵢ + uᵢ·m·gᵢ·n₂·hνᵢ·Δνᵢ
//! ```
//!
//! with uᵢ = ±1 the direction, lᵢ the background loss, ζ the saturation
//! parameter and m = 2 polarization modes. The last term is the spontaneous
//! emission seed; it vanishes for single-frequency channels (Δν = 0).
//!
//! For a passive fiber n₂ ≡ 0 and the model reduces to plain attenuation.

use nalgebra::{DMatrix, DVector};

use crate::channels::{Channels, OpticalChannel};
use crate::error::{FiberAmpError, FiberAmpResult};
use crate::physics::constants::{NUMBER_OF_ASE_POLARIZATION_MODES, SIMULATION_MIN_POWER};
use crate::physics::conversions::photon_energy;
use crate::physics::RateEquationModel;

/// Giles model of a doped fiber without nonlinear effects
#[derive(Debug, Clone)]
pub struct GilesModel {
    // ==================== Per-channel coefficients ====================
    /// Absorption α \[1/m\]
    absorption: DVector<f64>,
    /// Gain g \[1/m\]
    gain: DVector<f64>,
    /// Background loss \[1/m\]
    loss: DVector<f64>,
    /// Direction u = ±1
    direction: DVector<f64>,
    /// m·g·hν·Δν: spontaneous emission seed at full inversion \[W/m\]
    spontaneous: DVector<f64>,
    /// 1 / (hν·ζ) \[m/W\], zero for passive fibers
    inverse_saturation: DVector<f64>,

    // ==================== Fiber ====================
    is_passive: bool,
}

impl GilesModel {
    /// Build the model from a channel registry and its fiber
    pub fn new(channels: &Channels) -> FiberAmpResult<Self> {
        let fiber = channels.fiber();
        let is_passive = fiber.is_passive_fiber();
        let zeta = fiber.saturation_parameter();
        if !is_passive && (zeta <= 0.0 || !zeta.is_finite()) {
            return Err(FiberAmpError::invalid(format!(
                "active fiber needs a positive saturation parameter, got {}",
                zeta
            )));
        }

        let collect = |f: fn(&OpticalChannel) -> f64| -> DVector<f64> {
            DVector::from_iterator(channels.total_count(), channels.iter().map(f))
        };

        let absorption = collect(OpticalChannel::absorption_coefficient);
        let gain = collect(OpticalChannel::gain_coefficient);
        let loss = collect(OpticalChannel::background_loss);
        let direction = collect(|c| c.direction().sign());

        let spontaneous = DVector::from_iterator(
            channels.total_count(),
            channels.iter().map(|c| {
                NUMBER_OF_ASE_POLARIZATION_MODES
                    * c.gain_coefficient()
                    * photon_energy(c.frequency())
                    * c.frequency_bandwidth()
            }),
        );

        let inverse_saturation = DVector::from_iterator(
            channels.total_count(),
            channels.iter().map(|c| {
                if is_passive {
                    0.0
                } else {
                    1.0 / (photon_energy(c.frequency()) * zeta)
                }
            }),
        );

        Ok(Self {
            absorption,
            gain,
            loss,
            direction,
            spontaneous,
            inverse_saturation,
            is_passive,
        })
    }

    pub fn is_passive(&self) -> bool {
        self.is_passive
    }

    /// Upper level fraction for one column of (already floored) powers
    fn column_upper_level_fraction(&self, powers: impl Iterator<Item = f64>) -> f64 {
        if self.is_passive {
            return 0.0;
        }
        let mut absorbed = 0.0;
        let mut total = 1.0;
        for (i, p) in powers.enumerate() {
            let rate = p * self.inverse_saturation[i];
            absorbed += rate * self.absorption[i];
            total += rate * (self.absorption[i] + self.gain[i]);
        }
        (absorbed / total).clamp(0.0, 1.0)
    }

    /// Giles derivative with the powers already floored
    pub(crate) fn derivative_floored(&self, floored: &DMatrix<f64>) -> DMatrix<f64> {
        let mut derivative = DMatrix::zeros(floored.nrows(), floored.ncols());

        for (j, column) in floored.column_iter().enumerate() {
            let n2 = self.column_upper_level_fraction(column.iter().copied());
            for i in 0..floored.nrows() {
                let a = self.absorption[i];
                let g = self.gain[i];
                let net = (a + g) * n2 - a - self.loss[i];
                derivative[(i, j)] =
                    self.direction[i] * (net * column[i] + self.spontaneous[i] * n2);
            }
        }

        derivative
    }
}

/// Copy of `powers` with every entry raised to the power floor
pub(crate) fn floor_powers(powers: &DMatrix<f64>) -> DMatrix<f64> {
    powers.map(|p| p.max(SIMULATION_MIN_POWER))
}

impl RateEquationModel for GilesModel {
    fn dimension(&self) -> usize {
        self.absorption.len()
    }

    fn derivative(&self, _z: &DVector<f64>, powers: &DMatrix<f64>) -> DMatrix<f64> {
        self.derivative_floored(&floor_powers(powers))
    }

    fn upper_level_fraction(&self, powers: &DMatrix<f64>) -> DVector<f64> {
        let floored = floor_powers(powers);
        DVector::from_iterator(
            floored.ncols(),
            floored
                .column_iter()
                .map(|column| self.column_upper_level_fraction(column.iter().copied())),
        )
    }

    fn name(&self) -> &str {
        "Giles"
    }
}

// =================================================================================================
// Tests
// =================================================================================================
