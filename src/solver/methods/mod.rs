//! Numerical methods for two-point boundary value problems
//!
//! This module contains concrete implementations of the
//! [`BvpSolver`](crate::solver::BvpSolver) trait.
//!
//! # Available Methods
//!
//! - **[`CollocationSolver`]**: 4th-order Lobatto IIIA collocation
//!   - Damped Newton on a banded global system
//!   - Mesh refinement driven by the relative residual of the cubic interpolant
//!   - Handles counter-propagating channels without shooting
//!
//! # Performance Considerations
//!
//! The Newton matrix is banded, so a solve costs O(m·n³) for m nodes and n
//! channels. With the `parallel` feature the finite-difference Jacobian
//! columns are evaluated with Rayon once `channels × nodes` reaches
//! [`SolverConfiguration::parallel_threshold`](crate::solver::SolverConfiguration).

mod banded;
mod collocation;

pub use collocation::CollocationSolver;
