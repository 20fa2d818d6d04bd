//! Boundary-value solver traits and types
//!
//! # Design
//!
//! - [`BvpSolver`]: the numerical method, independent of the physics
//! - [`SolverConfiguration`]: HOW to solve (tolerances, node budget)
//! - [`BvpSolution`]: the refined mesh, the powers on it and a status
//!
//! A solver never panics on a hard problem: it reports a non-converged
//! [`SolverStatus`] in the solution, and the caller decides whether that is
//! an error.

use std::collections::HashMap;
use std::fmt;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{FiberAmpError, FiberAmpResult};
use crate::physics::constants::SOLVER_MAX_NODES;
use crate::solver::BvpScenario;

// =================================================================================================
// Solver Status
// =================================================================================================

/// Outcome of a boundary-value solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// Collocation residuals below tolerance on the final mesh
    Converged,
    /// Mesh refinement needed more nodes than allowed
    MaxNodesExceeded,
    /// Newton iterations did not converge on some mesh
    NewtonDidNotConverge,
    /// The Newton system could not be factorized
    SingularJacobian,
    /// NaN or Inf appeared in the iterate
    NonFinite,
}

impl SolverStatus {
    pub fn is_success(self) -> bool {
        self == SolverStatus::Converged
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SolverStatus::Converged => "converged",
            SolverStatus::MaxNodesExceeded => "maximum number of mesh nodes exceeded",
            SolverStatus::NewtonDidNotConverge => "Newton iterations did not converge",
            SolverStatus::SingularJacobian => "singular Jacobian",
            SolverStatus::NonFinite => "non-finite values in the solution",
        };
        f.write_str(text)
    }
}

// =================================================================================================
// Solver configuration
// =================================================================================================

/// Numerical parameters of a boundary-value solve
///
/// # Examples
///
/// ```rust
/// use fiberamp::solver::SolverConfiguration;
///
/// let config = SolverConfiguration::with_tolerance(1e-4);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_nodes, 100_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfiguration {
    /// Relative tolerance on the collocation residuals
    pub tolerance: f64,

    /// Largest mesh the refinement may create
    pub max_nodes: usize,

    /// Newton iterations allowed per mesh
    pub max_newton_iterations: usize,

    /// Tolerance on the boundary condition residuals (absolute, in W)
    pub boundary_tolerance: f64,

    /// Number of unknowns (channels × nodes) from which Jacobian columns
    /// are evaluated in parallel (only with the `parallel` feature)
    pub parallel_threshold: usize,
}

impl Default for SolverConfiguration {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_nodes: SOLVER_MAX_NODES,
            max_newton_iterations: 25,
            boundary_tolerance: 1e-9,
            parallel_threshold: 1000,
        }
    }
}

impl SolverConfiguration {
    /// Default configuration with another residual tolerance
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> FiberAmpResult<()> {
        if self.tolerance <= 0.0 || !self.tolerance.is_finite() {
            return Err(FiberAmpError::invalid(format!(
                "solver tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.boundary_tolerance <= 0.0 || !self.boundary_tolerance.is_finite() {
            return Err(FiberAmpError::invalid(format!(
                "boundary tolerance must be positive, got {}",
                self.boundary_tolerance
            )));
        }
        if self.max_nodes < 2 {
            return Err(FiberAmpError::invalid(format!(
                "max_nodes must be at least 2, got {}",
                self.max_nodes
            )));
        }
        if self.max_newton_iterations == 0 {
            return Err(FiberAmpError::invalid("max_newton_iterations must be positive"));
        }
        Ok(())
    }
}

// =================================================================================================
// Solution
// =================================================================================================

/// Result of a boundary-value solve
#[derive(Debug, Clone)]
pub struct BvpSolution {
    /// Final mesh, possibly refined beyond the initial one
    pub z: DVector<f64>,

    /// Powers on the final mesh, shape (dimension, z.len())
    pub powers: DMatrix<f64>,

    pub status: SolverStatus,

    /// Total Newton iterations over all meshes
    pub iterations: usize,

    /// Largest relative collocation residual on the final mesh
    pub max_residual: f64,

    /// Solver-specific details (method, mesh refinements, ...)
    pub metadata: HashMap<String, String>,
}

impl BvpSolution {
    pub fn new(z: DVector<f64>, powers: DMatrix<f64>, status: SolverStatus) -> Self {
        Self {
            z,
            powers,
            status,
            iterations: 0,
            max_residual: f64::NAN,
            metadata: HashMap::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn nodes(&self) -> usize {
        self.z.len()
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Turn a failed status into [`FiberAmpError::SolverFailure`]
    pub fn into_result(self) -> FiberAmpResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FiberAmpError::SolverFailure {
                status: self.status,
                nodes: self.nodes(),
                message: format!("largest collocation residual {:.3e}", self.max_residual),
            })
        }
    }
}

// =================================================================================================
// Solver Trait
// =================================================================================================

/// Two-point boundary-value solver
///
/// Solves dy/dz = f(z, y) on the scenario's mesh subject to g(y(0), y(L)) = 0.
pub trait BvpSolver: Send + Sync {
    /// Solve a scenario
    ///
    /// Returns `Err` for invalid input (bad configuration, shape mismatch) and
    /// `Ok` with a non-converged status when the numerics fail.
    fn solve(&self, scenario: &BvpScenario, config: &SolverConfiguration) -> FiberAmpResult<BvpSolution>;

    /// Name of the method
    fn name(&self) -> &str;
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = SolverConfiguration::default();
        assert_eq!(config.tolerance, 1e-3);
        assert_eq!(config.max_nodes, SOLVER_MAX_NODES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(SolverConfiguration::with_tolerance(0.0).validate().is_err());
        let config = SolverConfiguration {
            max_nodes: 1,
            ..SolverConfiguration::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configuration_from_json_uses_defaults() {
        let config: SolverConfiguration = serde_json::from_str(r#"{"tolerance": 1e-4}"#).unwrap();
        assert_eq!(config.tolerance, 1e-4);
        assert_eq!(config.max_newton_iterations, 25);
    }

    #[test]
    fn test_failed_solution_becomes_error() {
        let solution = BvpSolution::new(
            DVector::from_vec(vec![0.0, 1.0]),
            DMatrix::zeros(1, 2),
            SolverStatus::NewtonDidNotConverge,
        );
        let error = solution.into_result().unwrap_err();
        assert!(matches!(
            error,
            FiberAmpError::SolverFailure {
                status: SolverStatus::NewtonDidNotConverge,
                nodes: 2,
                ..
            }
        ));
    }
}
