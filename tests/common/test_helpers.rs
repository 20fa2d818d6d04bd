//! Helper functions for integration tests

use fiberamp::channels::Direction;
use fiberamp::physics::RateEquationModel;
use fiberamp::simulation::SimulationResult;
use fiberamp::solver::{BoundaryConditions, BvpScenario};
use nalgebra::{DMatrix, DVector};

/// `n` evenly spaced points over [0, length]
pub fn linspace(n: usize, length: f64) -> DVector<f64> {
    DVector::from_fn(n, |i, _| length * i as f64 / (n - 1) as f64)
}

/// Scenario on an even mesh with a flat initial guess
pub fn create_scenario(
    model: Box<dyn RateEquationModel>,
    boundary: Box<dyn BoundaryConditions>,
    npoints: usize,
    length: f64,
    guess: f64,
) -> BvpScenario {
    let n = model.dimension();
    BvpScenario::new(model, boundary, linspace(npoints, length), DMatrix::from_element(n, npoints, guess)).unwrap()
}

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// Photon flux entering and leaving the fiber, as (in, out), in units of W/Hz
pub fn photon_flux_balance(result: &SimulationResult, frequencies: &[f64], directions: &[Direction]) -> (f64, f64) {
    let powers = result.powers();
    let last = powers.ncols() - 1;
    let mut flux_in = 0.0;
    let mut flux_out = 0.0;
    for (i, (nu, direction)) in frequencies.iter().zip(directions).enumerate() {
        let (entry, exit) = match direction {
            Direction::Forward => (0, last),
            Direction::Backward => (last, 0),
        };
        flux_in += powers[(i, entry)] / nu;
        flux_out += powers[(i, exit)] / nu;
    }
    (flux_in, flux_out)
}
