//! Mock rate-equation models for testing
//!
//! These models have known analytical solutions, making them
//! ideal for validating the boundary-value solver.

use fiberamp::physics::RateEquationModel;
use fiberamp::solver::{BoundaryConditions, BoundarySide};
use nalgebra::{DMatrix, DVector};

// =================================================================================================
// Exponential Decay: dP/dz = -k*P
// =================================================================================================

/// Independent channels decaying along z
///
/// Analytical solution: P(z) = P₀ * exp(-k*z)
pub struct ExponentialDecay {
    pub channels: usize,
    pub decay_rate: f64,
}

impl ExponentialDecay {
    pub fn new(channels: usize, decay_rate: f64) -> Self {
        Self { channels, decay_rate }
    }

    pub fn analytical_solution(&self, z: f64, p0: f64) -> f64 {
        p0 * (-self.decay_rate * z).exp()
    }
}

impl RateEquationModel for ExponentialDecay {
    fn dimension(&self) -> usize {
        self.channels
    }

    fn derivative(&self, _z: &DVector<f64>, powers: &DMatrix<f64>) -> DMatrix<f64> {
        powers * -self.decay_rate
    }

    fn upper_level_fraction(&self, powers: &DMatrix<f64>) -> DVector<f64> {
        DVector::zeros(powers.ncols())
    }

    fn name(&self) -> &str {
        "Exponential Decay"
    }
}

// =================================================================================================
// Counter-propagating pair with linear coupling
// =================================================================================================

/// Forward channel F and backward channel B exchanging power:
///
/// ```text
/// dF/dz = -k·F + c·B
/// dB/dz =  k·B - c·F
/// ```
///
/// Both channels lose power along their own direction and feed the other one.
pub struct CounterPropagatingPair {
    pub loss: f64,
    pub coupling: f64,
}

impl RateEquationModel for CounterPropagatingPair {
    fn dimension(&self) -> usize {
        2
    }

    fn derivative(&self, _z: &DVector<f64>, powers: &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(2, powers.ncols(), |i, j| {
            let (f, b) = (powers[(0, j)], powers[(1, j)]);
            if i == 0 {
                -self.loss * f + self.coupling * b
            } else {
                self.loss * b - self.coupling * f
            }
        })
    }

    fn upper_level_fraction(&self, powers: &DMatrix<f64>) -> DVector<f64> {
        DVector::zeros(powers.ncols())
    }

    fn name(&self) -> &str {
        "Counter-propagating pair"
    }
}

// =================================================================================================
// Boundary conditions
// =================================================================================================

/// Channel i is pinned to `values[i]` at `sides[i]`
#[derive(Debug, Clone)]
pub struct PinnedInputs {
    pub values: Vec<f64>,
    pub sides: Vec<BoundarySide>,
}

impl BoundaryConditions for PinnedInputs {
    fn dimension(&self) -> usize {
        self.values.len()
    }

    fn residual(&self, start: &DVector<f64>, end: &DVector<f64>) -> DVector<f64> {
        DVector::from_fn(self.values.len(), |i, _| match self.sides[i] {
            BoundarySide::Start => start[i] - self.values[i],
            BoundarySide::End => end[i] - self.values[i],
        })
    }

    fn sides(&self) -> Vec<BoundarySide> {
        self.sides.clone()
    }
}
