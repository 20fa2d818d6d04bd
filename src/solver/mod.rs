//! Boundary-value solvers
//!
//! Steady-state amplifier powers are the solution of a two-point boundary
//! value problem: forward channels are known at z = 0, backward channels at
//! z = L, and dP/dz = f(z, P) in between.
//!
//! # Core Concepts
//!
//! ## The Architecture (WHAT vs HOW)
//!
//! 1. **Scenario** ([`BvpScenario`]) - WHAT to solve
//!    - Rate-equation model (right-hand side)
//!    - Boundary conditions
//!    - Initial mesh and guess
//!
//! 2. **Configuration** ([`SolverConfiguration`]) - HOW to solve
//!    - Residual tolerance, node budget, Newton iterations
//!
//! 3. **Solver** ([`BvpSolver`] trait) - The numerical method
//!    - Independent of the physics
//!    - Reports a [`SolverStatus`] instead of failing on hard problems
//!
//! # Module Organization
//!
//! - **`traits`**: `BvpSolver`, `SolverConfiguration`, `BvpSolution`, `SolverStatus`
//! - **`boundary`**: `BoundaryConditions` trait and the input-power conditions
//! - **`guess`**: initial guess construction from the channel inputs
//! - **`scenario`**: problem definition and validation
//! - **`methods`**: `CollocationSolver`
//!
//! # Workflow Diagram
//!
//! ```text
//! ┌──────────────┐ ┌────────────────────┐ ┌───────────────────┐
//! │ RateEquation │ │ BoundaryConditions │ │ InitialGuessMaker │
//! │ Model        │ │ (input powers)     │ │ (mesh + guess)    │
//! └──────┬───────┘ └─────────┬──────────┘ └─────────┬─────────┘
//!        │                   │                      │
//!        └───────────────────┼──────────────────────┘
//!                            │
//!          ┌─────────────────▼─────┐
//!          │ BvpScenario           │ ← WHAT to solve
//!          └───────────┬───────────┘
//!                      │
//!          ┌───────────▼───────────┐
//!          │ SolverConfiguration   │ ← HOW to solve
//!          └───────────┬───────────┘
//!                      │
//!          ┌───────────▼───────────┐
//!          │ CollocationSolver     │ ← The method
//!          └───────────┬───────────┘
//!                      │
//!          ┌───────────▼───────────┐
//!          │ BvpSolution           │ ← refined mesh + powers + status
//!          └───────────────────────┘
//! ```
//!
//! # Quick Start Example
//!
//! ```rust,ignore
//! use fiberamp::solver::{BvpScenario, BvpSolver, CollocationSolver, SolverConfiguration};
//!
//! let scenario = BvpScenario::new(Box::new(model), Box::new(boundary), z, guess)?;
//! let solution = CollocationSolver::new()
//!     .solve(&scenario, &SolverConfiguration::with_tolerance(1e-3))?
//!     .into_result()?;
//! println!("{} nodes, residual {:.2e}", solution.nodes(), solution.max_residual);
//! ```

// =================================================================================================
// Module Declarations
// =================================================================================================
mod traits;
mod boundary;
mod guess;
mod scenario;
mod methods;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use traits::{BvpSolution, BvpSolver, SolverConfiguration, SolverStatus};

pub use boundary::{BasicBoundaryConditions, BoundaryConditions, BoundarySide};
pub use guess::{GuessParameters, InitialGuessMaker, SignalGainShape};
pub use scenario::BvpScenario;

pub use methods::CollocationSolver;

// =================================================================================================
// Helper Functions
// =================================================================================================

use nalgebra::DMatrix;

use crate::error::{FiberAmpError, FiberAmpResult};

/// Check a power array for NaN or Inf
///
/// The reported index is the column-major position of the first bad value.
///
/// ```rust,ignore
/// validate_state(&iterate, "Newton iterate")?;
/// ```
pub(crate) fn validate_state(powers: &DMatrix<f64>, what: &str) -> FiberAmpResult<()> {
    match powers.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(FiberAmpError::NonFinite {
            what: what.to_string(),
            index,
        }),
        None => Ok(()),
    }
}

// =================================================================================================
// Tests
// =================================================================================================
