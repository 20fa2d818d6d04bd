//! Initial guess for the boundary-value solver
//!
//! Newton iterations only converge from a reasonable starting point. The
//! guess is assembled category by category: each category gets a start
//! vector (values at z = 0) and an end vector (values at z = L), interpolated
//! over the mesh.
//!
//! | Category        | start                | end                           |
//! |-----------------|----------------------|-------------------------------|
//! | signal          | P_in                 | P_in + c·ΣP_pump              |
//! | co-pump         | P_in                 | a·P_in                        |
//! | counter-pump    | a·P_in               | P_in                          |
//! | forward ASE     | P_in                 | P_ase                         |
//! | backward ASE    | P_ase                | P_in                          |
//! | forward Raman   | P_in                 | 2·P_in                        |
//! | backward Raman  | P_in                 | P_in                          |
//!
//! with c the signal conversion guess, a the pump absorption factor and
//! P_ase the ASE output power guess. Start and end always refer to z = 0 and
//! z = L, whatever the propagation direction.

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::channels::{ChannelCategory, SliceMap};
use crate::error::{FiberAmpError, FiberAmpResult};
use crate::physics::constants::SIMULATION_MIN_POWER;

// =================================================================================================
// Parameters
// =================================================================================================

/// Interpolation shape of the signal guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SignalGainShape {
    #[default]
    Linear,
    /// start·exp(z·ln(end/start)/L)
    Exponential,
}

impl FromStr for SignalGainShape {
    type Err = FiberAmpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(SignalGainShape::Linear),
            "exponential" => Ok(SignalGainShape::Exponential),
            other => Err(FiberAmpError::invalid(format!(
                "unrecognized signal gain shape '{}', expected 'linear' or 'exponential'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for SignalGainShape {
    type Error = FiberAmpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SignalGainShape> for String {
    fn from(shape: SignalGainShape) -> Self {
        shape.to_string()
    }
}

impl fmt::Display for SignalGainShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalGainShape::Linear => write!(f, "linear"),
            SignalGainShape::Exponential => write!(f, "exponential"),
        }
    }
}

/// Heuristics of the initial guess
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuessParameters {
    /// Fraction of the total pump power assumed converted to signal
    pub signal_conversion_guess: f64,
    pub signal_gain_shape: SignalGainShape,
    /// Fraction of pump power left at the far end, in [0, 1]
    pub pump_absorption_factor: f64,
    /// ASE power assumed at the exit end \[W\]
    pub ase_output_power: f64,
}

impl Default for GuessParameters {
    fn default() -> Self {
        Self {
            signal_conversion_guess: 0.5,
            signal_gain_shape: SignalGainShape::Linear,
            pump_absorption_factor: 0.01,
            ase_output_power: 1e-3,
        }
    }
}

impl GuessParameters {
    pub fn validate(&self) -> FiberAmpResult<()> {
        if self.signal_conversion_guess < 0.0 || !self.signal_conversion_guess.is_finite() {
            return Err(FiberAmpError::invalid(format!(
                "signal_conversion_guess must be non-negative, got {}",
                self.signal_conversion_guess
            )));
        }
        if !(0.0..=1.0).contains(&self.pump_absorption_factor) {
            return Err(FiberAmpError::invalid(format!(
                "pump_absorption_factor must be in [0, 1], got {}",
                self.pump_absorption_factor
            )));
        }
        if self.ase_output_power <= 0.0 || !self.ase_output_power.is_finite() {
            return Err(FiberAmpError::invalid(format!(
                "ase_output_power must be positive, got {}",
                self.ase_output_power
            )));
        }
        Ok(())
    }
}

// =================================================================================================
// Initial Guess Maker
// =================================================================================================

/// Builds the (channel × mesh) starting array of the solver
#[derive(Debug, Clone)]
pub struct InitialGuessMaker<'a> {
    input_powers: &'a [f64],
    slices: &'a SliceMap,
    z: &'a DVector<f64>,
    params: GuessParameters,
}

impl<'a> InitialGuessMaker<'a> {
    /// Checks that the inputs agree with each other
    ///
    /// `z` must be increasing with at least two points and `input_powers`
    /// must have one entry per channel of `slices`.
    pub fn new(
        input_powers: &'a [f64],
        slices: &'a SliceMap,
        z: &'a DVector<f64>,
        params: GuessParameters,
    ) -> FiberAmpResult<Self> {
        params.validate()?;
        if input_powers.len() != slices.total() {
            return Err(FiberAmpError::shape(
                "input powers",
                slices.total(),
                input_powers.len(),
            ));
        }
        if z.len() < 2 {
            return Err(FiberAmpError::invalid(format!(
                "the mesh needs at least two points, got {}",
                z.len()
            )));
        }
        if z.as_slice().windows(2).any(|w| w[1] <= w[0]) {
            return Err(FiberAmpError::invalid("mesh points must be strictly increasing"));
        }

        Ok(Self {
            input_powers,
            slices,
            z,
            params,
        })
    }

    /// (channels, mesh points)
    pub fn guess_shape(&self) -> (usize, usize) {
        (self.input_powers.len(), self.z.len())
    }

    pub fn make_guess(&self) -> DMatrix<f64> {
        let (rows, cols) = self.guess_shape();
        let mut guess = DMatrix::zeros(rows, cols);

        for (category, range) in self.slices.iter() {
            if range.is_empty() {
                continue;
            }
            let (start, end) = self.endpoints(category);
            let block = match (category, self.params.signal_gain_shape) {
                (ChannelCategory::Signal, SignalGainShape::Exponential) => self.exponential_guess(&start, &end),
                _ => self.linear_guess(&start, &end),
            };
            guess.rows_mut(range.start, range.len()).copy_from(&block);
        }

        guess
    }

    /// Values at z = 0 and z = L of one category
    fn endpoints(&self, category: ChannelCategory) -> (Vec<f64>, Vec<f64>) {
        let inputs = &self.input_powers[self.slices.slice(category)];
        let p = &self.params;
        let scaled = |factor: f64| inputs.iter().map(|x| factor * x).collect::<Vec<f64>>();
        let constant = vec![p.ase_output_power; inputs.len()];

        match category {
            ChannelCategory::Signal => {
                let pump_power: f64 = self.input_powers[self.slices.slice(ChannelCategory::CoPump)]
                    .iter()
                    .chain(&self.input_powers[self.slices.slice(ChannelCategory::CounterPump)])
                    .sum();
                let conversion = p.signal_conversion_guess * pump_power;
                (inputs.to_vec(), inputs.iter().map(|x| x + conversion).collect())
            }
            ChannelCategory::CoPump => (inputs.to_vec(), scaled(p.pump_absorption_factor)),
            ChannelCategory::CounterPump => (scaled(p.pump_absorption_factor), inputs.to_vec()),
            ChannelCategory::ForwardAse => (inputs.to_vec(), constant),
            ChannelCategory::BackwardAse => (constant, inputs.to_vec()),
            ChannelCategory::ForwardRaman => (inputs.to_vec(), scaled(2.0)),
            ChannelCategory::BackwardRaman => (inputs.to_vec(), inputs.to_vec()),
        }
    }

    /// start·(1 − t) + end·t with t = (z − z₀)/(z_L − z₀)
    fn linear_guess(&self, start: &[f64], end: &[f64]) -> DMatrix<f64> {
        let (z0, length) = self.span();
        DMatrix::from_fn(start.len(), self.z.len(), |i, j| {
            let t = (self.z[j] - z0) / length;
            let (a, b) = (floor(start[i]), floor(end[i]));
            if j + 1 == self.z.len() {
                b
            } else {
                a * (1.0 - t) + b * t
            }
        })
    }

    /// start·exp((z − z₀)·ln(end/start)/(z_L − z₀))
    fn exponential_guess(&self, start: &[f64], end: &[f64]) -> DMatrix<f64> {
        let (z0, length) = self.span();
        DMatrix::from_fn(start.len(), self.z.len(), |i, j| {
            let (a, b) = (floor(start[i]), floor(end[i]));
            let rate = (b / a).ln() / length;
            a * (rate * (self.z[j] - z0)).exp()
        })
    }

    fn span(&self) -> (f64, f64) {
        let z0 = self.z[0];
        (z0, self.z[self.z.len() - 1] - z0)
    }
}

fn floor(power: f64) -> f64 {
    power.max(SIMULATION_MIN_POWER)
}

// =================================================================================================
// Tests
// =================================================================================================
