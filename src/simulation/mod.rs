//! Amplifier simulations
//!
//! A simulation collects channels on a fiber, then turns them into a
//! boundary-value problem and solves it:
//!
//! 1. Take the slice map of the channel registry
//! 2. Build the initial mesh (evenly spaced) and the initial guess
//! 3. Build the rate-equation model and the input power boundary conditions
//! 4. Solve, fail on any non-converged status
//! 5. Freeze the registry and wrap the solution in a [`SimulationResult`]
//!
//! Every call to `run` repeats these steps from the registry, so two runs with
//! different `npoints` or `tol` are independent of each other.
//!
//! # Example
//!
//! ```rust,ignore
//! use fiberamp::prelude::*;
//!
//! let mut simulation = FiberAmplifierSimulation::new(fiber);
//! simulation.add_cw_signal(1030e-9, 0.1, 0.0)?;
//! simulation.add_backward_pump(976e-9, 10.0, 0.0)?;
//! simulation.add_ase(1000e-9, 1100e-9, 20)?;
//!
//! let result = simulation.run(20, 1e-3)?;
//! println!("signal gain: {:.1} dB", result.signal_gains_db()[0]);
//! ```

mod result;

pub use result::SimulationResult;

use std::sync::Arc;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::channels::Channels;
use crate::error::{FiberAmpError, FiberAmpResult};
use crate::fiber::Fiber;
use crate::models::{GilesModel, GilesModelWithRaman};
use crate::physics::RateEquationModel;
use crate::solver::{
    BasicBoundaryConditions, BvpScenario, BvpSolver, CollocationSolver, GuessParameters,
    InitialGuessMaker, SolverConfiguration,
};

/// Lifecycle of a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationState {
    /// No channel added yet
    Unconfigured,
    /// Channels are being added
    Configuring,
    /// At least one run succeeded; the registry is frozen
    Solved,
}

// =================================================================================================
// Giles simulation
// =================================================================================================

/// Steady-state simulation with the Giles model
pub struct FiberAmplifierSimulation {
    channels: Channels,
    guess_parameters: GuessParameters,
    solver: Box<dyn BvpSolver>,
    state: SimulationState,
}

impl FiberAmplifierSimulation {
    pub fn new(fiber: impl Fiber + 'static) -> Self {
        Self::with_shared_fiber(Arc::new(fiber))
    }

    /// Simulation on a fiber shared with other simulations
    pub fn with_shared_fiber(fiber: Arc<dyn Fiber>) -> Self {
        Self {
            channels: Channels::new(fiber),
            guess_parameters: GuessParameters::default(),
            solver: Box::new(CollocationSolver::new()),
            state: SimulationState::Unconfigured,
        }
    }

    /// Replace the initial guess parameters
    pub fn with_guess_parameters(mut self, parameters: GuessParameters) -> FiberAmpResult<Self> {
        parameters.validate()?;
        self.guess_parameters = parameters;
        Ok(self)
    }

    /// Replace the boundary-value solver
    pub fn with_solver(mut self, solver: impl BvpSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    pub fn fiber(&self) -> &dyn Fiber {
        self.channels.fiber()
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    pub fn guess_parameters(&self) -> &GuessParameters {
        &self.guess_parameters
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    // ====================================== Channels =============================================

    /// Forward CW signal; a zero `mode_field_diameter` uses the fiber's own mode
    pub fn add_cw_signal(&mut self, wavelength: f64, power: f64, mode_field_diameter: f64) -> FiberAmpResult<()> {
        self.configure(|channels| channels.add_forward_signal(wavelength, power, mode_field_diameter))
    }

    pub fn add_forward_pump(&mut self, wavelength: f64, power: f64, mode_field_diameter: f64) -> FiberAmpResult<()> {
        self.configure(|channels| channels.add_forward_pump(wavelength, power, mode_field_diameter))
    }

    pub fn add_backward_pump(&mut self, wavelength: f64, power: f64, mode_field_diameter: f64) -> FiberAmpResult<()> {
        self.configure(|channels| channels.add_backward_pump(wavelength, power, mode_field_diameter))
    }

    /// `n_bins` ASE channels in each direction over `[wl_start, wl_end]`
    pub fn add_ase(&mut self, wl_start: f64, wl_end: f64, n_bins: usize) -> FiberAmpResult<()> {
        self.configure(|channels| channels.add_ase(wl_start, wl_end, n_bins))
    }

    fn configure<F>(&mut self, add: F) -> FiberAmpResult<()>
    where
        F: FnOnce(&mut Channels) -> FiberAmpResult<()>,
    {
        add(&mut self.channels)?;
        if self.state == SimulationState::Unconfigured {
            self.state = SimulationState::Configuring;
        }
        Ok(())
    }

    // ====================================== Run ==================================================

    /// Solve on `npoints` evenly spaced initial nodes with residual tolerance `tol`
    pub fn run(&mut self, npoints: usize, tol: f64) -> FiberAmpResult<SimulationResult> {
        self.run_with(npoints, &SolverConfiguration::with_tolerance(tol))
    }

    /// Solve with a full solver configuration
    pub fn run_with(&mut self, npoints: usize, config: &SolverConfiguration) -> FiberAmpResult<SimulationResult> {
        self.run_model(npoints, config, |channels| {
            Ok(Box::new(GilesModel::new(channels)?) as Box<dyn RateEquationModel>)
        })
    }

    fn run_model<F>(&mut self, npoints: usize, config: &SolverConfiguration, build_model: F) -> FiberAmpResult<SimulationResult>
    where
        F: FnOnce(&Channels) -> FiberAmpResult<Box<dyn RateEquationModel>>,
    {
        // ====== Step 1: Validation ======

        if npoints < 2 {
            return Err(FiberAmpError::invalid(format!(
                "npoints must be at least 2, got {}",
                npoints
            )));
        }
        config.validate()?;
        if self.channels.is_empty() {
            return Err(FiberAmpError::invalid("nothing to simulate: add channels before running"));
        }

        // ====== Step 2: Boundary-value problem ======

        let slices = self.channels.get_slices();

        let length = self.channels.fiber().length();
        let z = DVector::from_fn(npoints, |i, _| length * i as f64 / (npoints - 1) as f64);
        let input_powers = self.channels.get_input_powers();
        let guess = InitialGuessMaker::new(&input_powers, &slices, &z, self.guess_parameters.clone())?.make_guess();

        let model = build_model(&self.channels)?;
        let boundary = BasicBoundaryConditions::new(&self.channels);
        let scenario = BvpScenario::new(model, Box::new(boundary), z, guess)?;

        info!(
            model = scenario.model_name(),
            solver = self.solver.name(),
            channels = slices.total(),
            npoints,
            length,
            "running fiber amplifier simulation"
        );

        // ====== Step 3: Solve ======

        let solution = self.solver.solve(&scenario, config)?.into_result()?;

        // ====== Step 4: Build Result ======

        // a failed solve leaves the registry open
        self.channels.freeze();

        let upper_level_fraction = scenario.model.upper_level_fraction(&solution.powers);
        let result = SimulationResult::new(
            solution.z,
            solution.powers,
            slices,
            self.channels.get_wavelengths(),
            upper_level_fraction,
            self.channels.fiber().is_passive_fiber(),
            self.channels.backward_raman_allowed(),
            scenario.model_name(),
            self.solver.name(),
            solution.iterations,
            solution.max_residual,
        );
        self.state = SimulationState::Solved;

        info!(
            nodes = result.nodes(),
            iterations = result.solver_iterations(),
            "simulation finished"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for FiberAmplifierSimulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FiberAmplifierSimulation")
            .field("channels", &self.channels.total_count())
            .field("solver", &self.solver.name())
            .field("state", &self.state)
            .finish()
    }
}

// =================================================================================================
// Giles + Raman simulation
// =================================================================================================

/// Steady-state simulation with the Giles model and stimulated Raman scattering
///
/// Adds pulsed signals (Raman is driven by the peak power) and the Stokes
/// channels of the first signal.
#[derive(Debug)]
pub struct FiberAmplifierSimulationWithRaman {
    inner: FiberAmplifierSimulation,
}

impl FiberAmplifierSimulationWithRaman {
    pub fn new(fiber: impl Fiber + 'static) -> Self {
        Self {
            inner: FiberAmplifierSimulation::new(fiber),
        }
    }

    pub fn with_shared_fiber(fiber: Arc<dyn Fiber>) -> Self {
        Self {
            inner: FiberAmplifierSimulation::with_shared_fiber(fiber),
        }
    }

    pub fn with_guess_parameters(self, parameters: GuessParameters) -> FiberAmpResult<Self> {
        Ok(Self {
            inner: self.inner.with_guess_parameters(parameters)?,
        })
    }

    pub fn with_solver(self, solver: impl BvpSolver + 'static) -> Self {
        Self {
            inner: self.inner.with_solver(solver),
        }
    }

    pub fn fiber(&self) -> &dyn Fiber {
        self.inner.fiber()
    }

    pub fn channels(&self) -> &Channels {
        self.inner.channels()
    }

    pub fn state(&self) -> SimulationState {
        self.inner.state()
    }

    // ====================================== Channels =============================================

    pub fn add_cw_signal(&mut self, wavelength: f64, power: f64, mode_field_diameter: f64) -> FiberAmpResult<()> {
        self.inner.add_cw_signal(wavelength, power, mode_field_diameter)
    }

    /// Forward signal of Gaussian pulses, `power` being the average power
    pub fn add_pulsed_signal(
        &mut self,
        wavelength: f64,
        power: f64,
        repetition_rate: f64,
        fwhm_duration: f64,
        mode_field_diameter: f64,
    ) -> FiberAmpResult<()> {
        self.inner.configure(|channels| {
            channels.add_pulsed_forward_signal(wavelength, power, repetition_rate, fwhm_duration, mode_field_diameter)
        })
    }

    pub fn add_forward_pump(&mut self, wavelength: f64, power: f64, mode_field_diameter: f64) -> FiberAmpResult<()> {
        self.inner.add_forward_pump(wavelength, power, mode_field_diameter)
    }

    pub fn add_backward_pump(&mut self, wavelength: f64, power: f64, mode_field_diameter: f64) -> FiberAmpResult<()> {
        self.inner.add_backward_pump(wavelength, power, mode_field_diameter)
    }

    pub fn add_ase(&mut self, wl_start: f64, wl_end: f64, n_bins: usize) -> FiberAmpResult<()> {
        self.inner.add_ase(wl_start, wl_end, n_bins)
    }

    /// Stokes channels of the first signal
    ///
    /// `input_power` seeds the Raman channels; pass
    /// [`SIMULATION_MIN_POWER`](crate::physics::constants::SIMULATION_MIN_POWER)
    /// for spontaneous Raman only.
    pub fn add_raman(&mut self, input_power: f64, backward_raman_allowed: bool) -> FiberAmpResult<()> {
        self.inner
            .configure(|channels| channels.add_raman(input_power, backward_raman_allowed))
    }

    // ====================================== Run ==================================================

    pub fn run(&mut self, npoints: usize, tol: f64) -> FiberAmpResult<SimulationResult> {
        self.run_with(npoints, &SolverConfiguration::with_tolerance(tol))
    }

    pub fn run_with(&mut self, npoints: usize, config: &SolverConfiguration) -> FiberAmpResult<SimulationResult> {
        self.inner.run_model(npoints, config, |channels| {
            Ok(Box::new(GilesModelWithRaman::new(channels)?) as Box<dyn RateEquationModel>)
        })
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChannelCategory;
    use crate::fiber::PassiveFiber;
    use crate::solver::{BvpSolution, SolverStatus};
    use approx::assert_relative_eq;

    fn passive_fiber(loss: f64) -> PassiveFiber {
        PassiveFiber::new(2.0, 3e-6, 0.12, loss).unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let mut simulation = FiberAmplifierSimulation::new(passive_fiber(0.1));
        assert_eq!(simulation.state(), SimulationState::Unconfigured);

        simulation.add_cw_signal(1064e-9, 1.0, 0.0).unwrap();
        assert_eq!(simulation.state(), SimulationState::Configuring);

        simulation.run(10, 1e-3).unwrap();
        assert_eq!(simulation.state(), SimulationState::Solved);
    }

    #[test]
    fn test_failed_add_keeps_state() {
        let mut simulation = FiberAmplifierSimulation::new(passive_fiber(0.1));
        assert!(simulation.add_ase(1100e-9, 1000e-9, 10).is_err());
        assert_eq!(simulation.state(), SimulationState::Unconfigured);
    }

    #[test]
    fn test_channels_frozen_after_run() {
        let mut simulation = FiberAmplifierSimulation::new(passive_fiber(0.1));
        simulation.add_cw_signal(1064e-9, 1.0, 0.0).unwrap();
        simulation.run(10, 1e-3).unwrap();

        let error = simulation.add_forward_pump(976e-9, 1.0, 0.0).unwrap_err();
        assert!(matches!(error, FiberAmpError::ChannelsFrozen));
    }

    #[test]
    fn test_run_twice_is_independent() {
        let mut simulation = FiberAmplifierSimulation::new(passive_fiber(0.1));
        simulation.add_cw_signal(1064e-9, 1.0, 0.0).unwrap();

        let first = simulation.run(5, 1e-3).unwrap();
        let second = simulation.run(30, 1e-4).unwrap();

        assert_relative_eq!(
            first.output_powers(ChannelCategory::Signal)[0],
            second.output_powers(ChannelCategory::Signal)[0],
            max_relative = 1e-3
        );
    }

    /// Hands the guess back with a failed status
    struct NodeBudgetExhausted;

    impl BvpSolver for NodeBudgetExhausted {
        fn solve(&self, scenario: &BvpScenario, _config: &SolverConfiguration) -> FiberAmpResult<BvpSolution> {
            Ok(BvpSolution::new(
                scenario.z.clone(),
                scenario.guess.clone(),
                SolverStatus::MaxNodesExceeded,
            ))
        }

        fn name(&self) -> &str {
            "Node budget exhausted"
        }
    }

    #[test]
    fn test_failed_run_leaves_channels_open() {
        let mut simulation = FiberAmplifierSimulation::new(passive_fiber(0.1)).with_solver(NodeBudgetExhausted);
        simulation.add_cw_signal(1064e-9, 1.0, 0.0).unwrap();

        let error = simulation.run(10, 1e-3).unwrap_err();
        assert!(matches!(
            error,
            FiberAmpError::SolverFailure {
                status: SolverStatus::MaxNodesExceeded,
                ..
            }
        ));
        assert_eq!(simulation.state(), SimulationState::Configuring);
        assert!(!simulation.channels().is_frozen());

        simulation.add_backward_pump(976e-9, 1.0, 0.0).unwrap();
        assert_eq!(simulation.channels().total_count(), 2);
    }

    #[test]
    fn test_run_without_channels() {
        let mut simulation = FiberAmplifierSimulation::new(passive_fiber(0.1));
        assert!(matches!(
            simulation.run(10, 1e-3),
            Err(FiberAmpError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_too_few_points() {
        let mut simulation = FiberAmplifierSimulation::new(passive_fiber(0.1));
        simulation.add_cw_signal(1064e-9, 1.0, 0.0).unwrap();
        assert!(simulation.run(1, 1e-3).is_err());
        assert_eq!(simulation.state(), SimulationState::Configuring);
    }

    #[test]
    fn test_raman_needs_a_signal() {
        let mut simulation = FiberAmplifierSimulationWithRaman::new(passive_fiber(0.0));
        assert!(simulation.add_raman(1e-18, true).is_err());

        simulation.add_cw_signal(1064e-9, 1.0, 0.0).unwrap();
        simulation.add_raman(1e-18, false).unwrap();
        assert_eq!(simulation.channels().total_count(), 2);
        assert!(!simulation.channels().backward_raman_allowed());
    }
}
