//! Physics building blocks
//!
//! This module gathers what the rate-equation models need from physics:
//!
//! - **Constants**: Planck constant, speed of light, Raman parameters, power floor
//! - **Conversions**: wavelength/frequency, bandwidths, mode field diameter,
//!   overlap and effective area approximations
//! - **Rate equation model trait**: the dP/dz = f(z, P) contract consumed by
//!   the boundary-value solver
//!
//! # Architecture
//!
//! Models are **separate from numerical solvers**:
//! - The model provides the **equations** (Giles rate equations, Raman coupling)
//! - The solver provides the **method** to solve them (collocation + Newton)
//!
//! # Example
//!
//! ```rust
//! use fiberamp::physics::conversions::{wl_to_freq, fundamental_mode_mfd_petermann_2};
//!
//! let frequency = wl_to_freq(1030e-9);
//! assert!(frequency > 2.9e14);
//!
//! let mfd = fundamental_mode_mfd_petermann_2(1030e-9, 3e-6, 0.12);
//! assert!(mfd > 6e-6);
//! ```

// module declaration
pub mod constants;
pub mod conversions;
pub mod traits;

// re-export commonly used types for convenience
pub use traits::RateEquationModel;
