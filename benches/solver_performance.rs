//! Performance benchmarks for the boundary-value solver
//!
//! # What We're Measuring
//!
//! 1. **Collocation on a linear model**: cost of one Newton solve as the
//!    number of channels grows (banded LU, O(m·n³))
//! 2. **Full amplifier runs**: Yb amplifier with an increasing number of ASE
//!    bins, mesh refinement included
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all solver benchmarks
//! cargo bench --bench solver_performance
//!
//! # Only the amplifier runs
//! cargo bench --bench solver_performance amplifier
//!
//! # With parallel Jacobian columns
//! cargo bench --bench solver_performance --features parallel
//! ```
//!
//! # Understanding Results
//!
//! ASE bins come in pairs (forward + backward), so 40 bins means 82 channels.
//! Doubling the channel count should cost a bit less than 8× while the
//! Jacobian is dominated by model evaluations, and approach 8× once the
//! banded factorization dominates.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use fiberamp::fiber::{ActiveFiber, CrossSectionSpectrum};
use fiberamp::physics::RateEquationModel;
use fiberamp::simulation::FiberAmplifierSimulation;
use fiberamp::solver::{BoundaryConditions, BoundarySide, BvpScenario, BvpSolver, CollocationSolver, SolverConfiguration};
use nalgebra::{DMatrix, DVector};
use std::hint::black_box;
use std::time::Duration;

// =================================================================================================
// Simple Model for Benchmarking
// =================================================================================================

/// Half the channels decay forward, half decay backward: dP/dz = -k·u·P
///
/// Linear, so Newton converges in one step and the benchmark isolates the
/// cost of Jacobian assembly and factorization.
struct AlternatingDecay {
    channels: usize,
}

impl RateEquationModel for AlternatingDecay {
    fn dimension(&self) -> usize {
        self.channels
    }

    fn derivative(&self, _z: &DVector<f64>, powers: &DMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(powers.nrows(), powers.ncols(), |i, j| {
            let sign = if i % 2 == 0 { -1.0 } else { 1.0 };
            0.1 * sign * powers[(i, j)]
        })
    }

    fn upper_level_fraction(&self, powers: &DMatrix<f64>) -> DVector<f64> {
        DVector::zeros(powers.ncols())
    }

    fn name(&self) -> &str {
        "Alternating Decay"
    }
}

#[derive(Debug)]
struct UnitInputs {
    channels: usize,
}

impl BoundaryConditions for UnitInputs {
    fn dimension(&self) -> usize {
        self.channels
    }

    fn residual(&self, start: &DVector<f64>, end: &DVector<f64>) -> DVector<f64> {
        DVector::from_fn(self.channels, |i, _| if i % 2 == 0 { start[i] - 1.0 } else { end[i] - 1.0 })
    }

    fn sides(&self) -> Vec<BoundarySide> {
        (0..self.channels)
            .map(|i| if i % 2 == 0 { BoundarySide::Start } else { BoundarySide::End })
            .collect()
    }
}

fn linear_scenario(channels: usize, nodes: usize) -> BvpScenario {
    let z = DVector::from_fn(nodes, |i, _| i as f64 / (nodes - 1) as f64);
    BvpScenario::new(
        Box::new(AlternatingDecay { channels }),
        Box::new(UnitInputs { channels }),
        z,
        DMatrix::from_element(channels, nodes, 1.0),
    )
    .unwrap()
}

fn ytterbium_fiber() -> ActiveFiber {
    let wavelengths = [960e-9, 990e-9, 1010e-9, 1100e-9];
    let absorption = CrossSectionSpectrum::from_wavelengths(&wavelengths, &[2.5e-24, 2.5e-24, 5e-27, 0.0]).unwrap();
    let gain = CrossSectionSpectrum::from_wavelengths(&wavelengths, &[2.5e-24, 2.5e-24, 6e-25, 1e-25]).unwrap();
    ActiveFiber::new(1.0, absorption, gain, 3e-6, 1e-3, 1e25, 0.0, 0.12)
        .unwrap()
        .use_constant_overlap(0.8)
        .unwrap()
}

// =================================================================================================
// Benchmarks
// =================================================================================================

/// One Newton solve on a fixed mesh of 50 nodes
fn benchmark_linear_collocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Collocation (linear model)");

    for channels in [2, 8, 32, 64].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(channels), channels, |b, &channels| {
            // Setup phase (NOT measured by criterion)
            let scenario = linear_scenario(channels, 50);
            let config = SolverConfiguration::default();
            let solver = CollocationSolver::new();

            b.iter(|| solver.solve(black_box(&scenario), black_box(&config)).unwrap());
        });
    }

    group.finish();
}

/// Complete amplifier runs, setup included
fn benchmark_amplifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("amplifier");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    for bins in [0, 10, 20, 40].iter() {
        group.bench_with_input(BenchmarkId::new("ase_bins", bins), bins, |b, &bins| {
            b.iter(|| {
                let mut simulation = FiberAmplifierSimulation::new(ytterbium_fiber());
                simulation.add_cw_signal(1030e-9, 0.01, 0.0).unwrap();
                simulation.add_forward_pump(976e-9, 2.0, 0.0).unwrap();
                if bins > 0 {
                    simulation.add_ase(1010e-9, 1090e-9, bins).unwrap();
                }
                simulation.run(black_box(20), black_box(1e-3)).unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_linear_collocation, benchmark_amplifier);
criterion_main!(benches);
