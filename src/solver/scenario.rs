//! Boundary-value problem definition
//!
//! A scenario combines a rate-equation model with boundary conditions, an
//! initial mesh and an initial guess on it.

use nalgebra::{DMatrix, DVector};

use crate::error::{FiberAmpError, FiberAmpResult};
use crate::physics::RateEquationModel;
use crate::solver::BoundaryConditions;

/// Two-point boundary value problem
///
/// # Design
///
/// The same scenario can be solved with different numerical methods.
/// This is the "WHAT to solve" (not "HOW to solve").
///
/// # Examples
///
/// ```rust,ignore
/// let scenario = BvpScenario::new(Box::new(model), Box::new(boundary), z, guess)?;
/// let solution = CollocationSolver::new().solve(&scenario, &config)?;
/// ```
pub struct BvpScenario {
    /// Right-hand side dP/dz = f(z, P)
    pub model: Box<dyn RateEquationModel>,

    /// Residual g(P(0), P(L))
    pub boundary: Box<dyn BoundaryConditions>,

    /// Initial mesh, strictly increasing
    pub z: DVector<f64>,

    /// Initial guess, shape (dimension, z.len())
    pub guess: DMatrix<f64>,
}

impl BvpScenario {
    /// Create a scenario and check that its parts agree
    pub fn new(
        model: Box<dyn RateEquationModel>,
        boundary: Box<dyn BoundaryConditions>,
        z: DVector<f64>,
        guess: DMatrix<f64>,
    ) -> FiberAmpResult<Self> {
        let scenario = Self {
            model,
            boundary,
            z,
            guess,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Fails fast on any shape disagreement
    pub fn validate(&self) -> FiberAmpResult<()> {
        let n = self.model.dimension();
        if n == 0 {
            return Err(FiberAmpError::invalid("nothing to solve: no channels were added"));
        }
        if self.boundary.dimension() != n {
            return Err(FiberAmpError::shape("boundary conditions", n, self.boundary.dimension()));
        }
        if self.boundary.sides().len() != n {
            return Err(FiberAmpError::shape("boundary sides", n, self.boundary.sides().len()));
        }
        if self.z.len() < 2 {
            return Err(FiberAmpError::invalid(format!(
                "the mesh needs at least two points, got {}",
                self.z.len()
            )));
        }
        if self.z.as_slice().windows(2).any(|w| w[1] <= w[0] || !w[1].is_finite()) {
            return Err(FiberAmpError::invalid("mesh points must be finite and strictly increasing"));
        }
        if self.guess.shape() != (n, self.z.len()) {
            return Err(FiberAmpError::shape(
                "initial guess",
                format!("{}x{}", n, self.z.len()),
                format!("{}x{}", self.guess.nrows(), self.guess.ncols()),
            ));
        }
        Ok(())
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Number of state variables
    pub fn dimension(&self) -> usize {
        self.model.dimension()
    }
}

impl std::fmt::Debug for BvpScenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BvpScenario")
            .field("model", &self.model_name())
            .field("dimension", &self.dimension())
            .field("nodes", &self.z.len())
            .field("boundary", &self.boundary)
            .finish()
    }
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::BoundarySide;

    // Mocking a rate-equation model
    struct Decay;

    impl RateEquationModel for Decay {
        fn dimension(&self) -> usize {
            2
        }

        fn derivative(&self, _z: &DVector<f64>, powers: &DMatrix<f64>) -> DMatrix<f64> {
            -powers
        }

        fn upper_level_fraction(&self, powers: &DMatrix<f64>) -> DVector<f64> {
            DVector::zeros(powers.ncols())
        }

        fn name(&self) -> &str {
            "Decay"
        }
    }

    #[derive(Debug)]
    struct PinStart(usize);

    impl BoundaryConditions for PinStart {
        fn dimension(&self) -> usize {
            self.0
        }

        fn residual(&self, start: &DVector<f64>, _end: &DVector<f64>) -> DVector<f64> {
            start.add_scalar(-1.0)
        }

        fn sides(&self) -> Vec<BoundarySide> {
            vec![BoundarySide::Start; self.0]
        }
    }

    fn mesh() -> DVector<f64> {
        DVector::from_vec(vec![0.0, 0.5, 1.0])
    }

    #[test]
    fn test_scenario_creation() {
        let scenario = BvpScenario::new(Box::new(Decay), Box::new(PinStart(2)), mesh(), DMatrix::zeros(2, 3)).unwrap();
        assert_eq!(scenario.model_name(), "Decay");
        assert_eq!(scenario.dimension(), 2);
    }

    #[test]
    fn test_guess_shape_mismatch() {
        let result = BvpScenario::new(Box::new(Decay), Box::new(PinStart(2)), mesh(), DMatrix::zeros(3, 3));
        assert!(matches!(result, Err(FiberAmpError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_boundary_dimension_mismatch() {
        let result = BvpScenario::new(Box::new(Decay), Box::new(PinStart(1)), mesh(), DMatrix::zeros(2, 3));
        assert!(matches!(result, Err(FiberAmpError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_decreasing_mesh() {
        let z = DVector::from_vec(vec![0.0, 1.0, 0.5]);
        let result = BvpScenario::new(Box::new(Decay), Box::new(PinStart(2)), z, DMatrix::zeros(2, 3));
        assert!(matches!(result, Err(FiberAmpError::InvalidConfiguration(_))));
    }
}
