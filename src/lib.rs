//! fiberamp: Steady-State Fiber Amplifier Simulation
//!
//! Models rare-earth-doped fiber amplifiers and passive fibers with the Giles
//! rate equations, optionally coupled to stimulated Raman scattering. Signals,
//! pumps, ASE and Raman channels may propagate in either direction, so the
//! steady state is a two-point boundary value problem solved by collocation.
//!
//! # Architecture
//!
//! fiberamp is built on two core principles:
//!
//! 1. **Separation of Physics and Numerics**
//!    - Rate-equation models define dP/dz (what to solve)
//!    - The boundary-value solver provides the method (how to solve)
//!
//! 2. **Typed channel bookkeeping**
//!    - Channels are grouped in a fixed set of categories
//!    - A slice map gives every category a contiguous block of state rows
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fiberamp::prelude::*;
//!
//! # fn main() -> FiberAmpResult<()> {
//! // Undoped fiber: 5 m, 3 µm core radius, NA 0.12, 0.01 1/m background loss
//! let fiber = PassiveFiber::new(5.0, 3e-6, 0.12, 0.01)?;
//!
//! let mut simulation = FiberAmplifierSimulation::new(fiber);
//! simulation.add_cw_signal(1064e-9, 1.0, 0.0)?;
//! simulation.add_backward_pump(976e-9, 2.0, 0.0)?;
//!
//! let result = simulation.run(20, 1e-3)?;
//! println!("signal out: {:.3} W", result.output_powers(ChannelCategory::Signal)[0]);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`fiber`]: Fiber descriptions (cross sections, mode field, overlap)
//! - [`channels`]: Optical channels and the channel registry
//! - [`models`]: Giles rate equations, with and without Raman
//! - [`solver`]: Boundary-value solvers (collocation)
//! - [`simulation`]: Orchestration and results
//! - [`output`]: CSV export
//!
//! # Features
//!
//! - `parallel`: finite-difference Jacobian columns evaluated with Rayon on
//!   large problems

pub mod error;

// Core modules
pub mod physics;
pub mod fiber;
pub mod channels;

pub mod models;
pub mod solver;
pub mod simulation;

pub mod output;

pub use error::{FiberAmpError, FiberAmpResult};

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use fiberamp::prelude::*;
    //! ```
    pub use crate::channels::{ChannelCategory, Channels, Direction, OpticalChannel, SliceMap};
    pub use crate::error::{FiberAmpError, FiberAmpResult};
    pub use crate::fiber::{ActiveFiber, CrossSectionSpectrum, EffectiveAreaType, Fiber, PassiveFiber};
    pub use crate::models::{GilesModel, GilesModelWithRaman};
    pub use crate::physics::RateEquationModel;
    pub use crate::simulation::{
        FiberAmplifierSimulation, FiberAmplifierSimulationWithRaman, SimulationResult, SimulationState,
    };
    pub use crate::solver::{
        BvpSolver, CollocationSolver, GuessParameters, SignalGainShape, SolverConfiguration, SolverStatus,
    };
}
