//! Example: Core-pumped Ytterbium Amplifier
//!
//! Simulates a 1030 nm signal amplified in a short Yb-doped fiber, pumped at
//! 976 nm from the far end, with 30 ASE bins in each direction. The power
//! evolution is written to a CSV file in the temporary directory.
//!
//! **Physical System**:
//! - Fiber: 1.5 m, 3 µm core radius, NA 0.12
//! - Dopant: 1e25 ions/m³, 1 ms upper state lifetime, overlap 0.8
//! - Signal: 10 mW CW at 1030 nm
//! - Pump: 3 W at 976 nm, counter-propagating
//!
//! Run with logs:
//!
//! ```bash
//! RUST_LOG=fiberamp=debug cargo run --example yb_amplifier
//! ```

use fiberamp::{
    channels::{ChannelCategory, Direction},
    fiber::{ActiveFiber, CrossSectionSpectrum},
    output::{export_power_evolution_csv, CsvConfig, CsvMetadata},
    simulation::FiberAmplifierSimulation,
    solver::SolverConfiguration,
};
use tracing_subscriber::EnvFilter;

use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fiberamp=info")))
        .init();

    println!("═══════════════════════════════════════════════════════");
    println!("  Core-pumped Yb amplifier");
    println!("═══════════════════════════════════════════════════════\n");

    // ====== Fiber ======

    // coarse Yb-like cross sections [m²]
    let wavelengths = [910e-9, 960e-9, 976e-9, 990e-9, 1010e-9, 1030e-9, 1060e-9, 1100e-9];
    let absorption = CrossSectionSpectrum::from_wavelengths(
        &wavelengths,
        &[8e-25, 1.2e-24, 2.6e-24, 4e-25, 5e-26, 6e-27, 1e-27, 0.0],
    )?;
    let gain = CrossSectionSpectrum::from_wavelengths(
        &wavelengths,
        &[5e-27, 2e-25, 2.6e-24, 8e-25, 7e-25, 6e-25, 2.5e-25, 8e-26],
    )?;

    let length = 1.5; // [m]
    let fiber = ActiveFiber::new(length, absorption, gain, 3e-6, 1e-3, 1e25, 0.0, 0.12)?.use_constant_overlap(0.8)?;

    // ====== Channels ======

    let signal_power = 0.01; // [W]
    let pump_power = 3.0; // [W]

    let mut simulation = FiberAmplifierSimulation::new(fiber);
    simulation.add_cw_signal(1030e-9, signal_power, 0.0)?;
    simulation.add_backward_pump(976e-9, pump_power, 0.0)?;
    simulation.add_ase(1000e-9, 1100e-9, 30)?;

    println!("Channels: {}", simulation.channels().total_count());
    println!("  L (length)     : {} m", length);
    println!("  signal         : {} W at 1030 nm", signal_power);
    println!("  counter pump   : {} W at 976 nm\n", pump_power);

    // ====== Solve ======

    let config = SolverConfiguration::with_tolerance(1e-4);
    let start = Instant::now();
    let result = simulation.run_with(20, &config)?;
    let elapsed = start.elapsed();

    println!("Solved in {:.2?}", elapsed);
    println!("  mesh nodes        : {}", result.nodes());
    println!("  Newton iterations : {}", result.solver_iterations());
    println!("  max residual      : {:.2e}\n", result.max_residual());

    // ====== Report ======

    let signal_out = result.output_powers(ChannelCategory::Signal)[0];
    let pump_out = result.output_powers(ChannelCategory::CounterPump)[0];

    println!("Signal out     : {:.4} W ({:.2} dB gain)", signal_out, result.signal_gains_db()[0]);
    println!("Residual pump  : {:.4} W", pump_out);
    println!("Forward ASE    : {:.3e} W", result.total_ase_output(Direction::Forward));
    println!("Backward ASE   : {:.3e} W", result.total_ase_output(Direction::Backward));
    println!(
        "Efficiency     : {:.1} %\n",
        100.0 * (signal_out - signal_power) / (pump_power - pump_out)
    );

    // ====== Export ======

    let path = std::env::temp_dir().join("yb_amplifier.csv");
    let mut metadata = CsvMetadata::from_result(&result);
    metadata.add_custom("Fiber length (m)", length);
    export_power_evolution_csv(&result, &path, Some(&CsvConfig::default().with_metadata(metadata)))?;
    println!("Power evolution written to {}", path.display());

    Ok(())
}
