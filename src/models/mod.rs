//! Rate-equation models of doped fibers
//!
//! All models implement the [`RateEquationModel`](crate::physics::RateEquationModel) trait.
//! The boundary-value solver evaluates `derivative` on whole meshes: models
//! are responsible for the physics (population inversion, gain, Raman
//! coupling), the solver for the two-point boundary value problem.
//!
//! # Available Models
//!
//! ## [`GilesModel`]
//!
//! Two-level Giles model. Signals, pumps and ASE bins share one upper level
//! population, recomputed at every position from the local powers.
//!
//! ## [`GilesModelWithRaman`]
//!
//! The Giles model plus stimulated Raman scattering from the signals into the
//! Raman Stokes channels. Pulsed signals drive the Raman process with their
//! peak power.
//!
//! # Power Floor
//!
//! Both models raise every power to
//! [`SIMULATION_MIN_POWER`](crate::physics::constants::SIMULATION_MIN_POWER)
//! before using it, so a Newton iterate that dips below zero never produces
//! NaN.

// =================================================================================================
// Module Declarations
// =================================================================================================

mod giles;
mod giles_raman;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use giles::GilesModel;
pub use giles_raman::GilesModelWithRaman;
