//! Integration tests: channels + models + solver + simulation
//!
//! These tests run complete simulations and check them against closed-form
//! solutions (passive fibers) or conservation laws (active fibers, Raman).

use approx::assert_relative_eq;
use fiberamp::channels::{ChannelCategory, Direction};
use fiberamp::physics::constants::SIMULATION_MIN_POWER;
use fiberamp::simulation::{FiberAmplifierSimulation, FiberAmplifierSimulationWithRaman, SimulationState};
use fiberamp::solver::{GuessParameters, SignalGainShape};

mod common;
use common::{passive_fiber, photon_flux_balance, ytterbium_fiber};

// =================================================================================================
// Passive fiber
// =================================================================================================

#[test]
fn test_passive_backward_pump_decays_from_the_far_end() {
    let (length, loss, power) = (2.0, 0.3, 4.0);
    let mut simulation = FiberAmplifierSimulation::new(passive_fiber(length, loss));
    simulation.add_backward_pump(976e-9, power, 0.0).unwrap();

    let result = simulation.run(20, 1e-3).unwrap();

    for (j, z) in result.z().iter().enumerate() {
        let expected = power * (-loss * (length - z)).exp();
        assert_relative_eq!(result.powers()[(0, j)], expected, max_relative = 1e-4);
    }
}

#[test]
fn test_passive_forward_and_backward_channels() {
    let (length, loss) = (5.0, 0.05);
    let mut simulation = FiberAmplifierSimulation::new(passive_fiber(length, loss));
    simulation.add_cw_signal(1064e-9, 1.0, 0.0).unwrap();
    simulation.add_backward_pump(976e-9, 2.0, 0.0).unwrap();

    let result = simulation.run(20, 1e-3).unwrap();

    assert!(result.is_passive_fiber());
    assert!(result.upper_level_fraction().iter().all(|n| *n == 0.0));

    let signal = result.channel_powers(ChannelCategory::Signal);
    assert_relative_eq!(signal[(0, 0)], 1.0, max_relative = 1e-9);
    assert_relative_eq!(
        result.output_powers(ChannelCategory::Signal)[0],
        (-loss * length).exp(),
        max_relative = 1e-4
    );
    assert_relative_eq!(
        result.output_powers(ChannelCategory::CounterPump)[0],
        2.0 * (-loss * length).exp(),
        max_relative = 1e-4
    );
}

#[test]
fn test_passive_microwatt_signal() {
    let (length, loss, power) = (2.0, 1.0, 1e-6);
    let mut simulation = FiberAmplifierSimulation::new(passive_fiber(length, loss));
    simulation.add_cw_signal(1064e-9, power, 0.0).unwrap();

    let result = simulation.run(20, 1e-3).unwrap();

    assert!(result.solver_iterations() > 0);
    assert_relative_eq!(
        result.output_powers(ChannelCategory::Signal)[0],
        power * (-loss * length).exp(),
        max_relative = 1e-4
    );
}

#[test]
fn test_passive_total_power_never_increases_along_forward_channels() {
    let mut simulation = FiberAmplifierSimulation::new(passive_fiber(3.0, 0.2));
    simulation.add_cw_signal(1064e-9, 0.5, 0.0).unwrap();
    simulation.add_forward_pump(976e-9, 1.5, 0.0).unwrap();

    let result = simulation.run(20, 1e-3).unwrap();

    let total = result.total_power();
    assert!(total.as_slice().windows(2).all(|w| w[1] <= w[0]));
}

// =================================================================================================
// Active fiber
// =================================================================================================

#[test]
fn test_forward_pumped_amplifier() {
    let (signal_in, pump_in) = (0.01, 2.0);
    let mut simulation = FiberAmplifierSimulation::new(ytterbium_fiber(1.0));
    simulation.add_cw_signal(1030e-9, signal_in, 0.0).unwrap();
    simulation.add_forward_pump(976e-9, pump_in, 0.0).unwrap();

    let result = simulation.run(20, 1e-3).unwrap();
    assert_eq!(simulation.state(), SimulationState::Solved);
    assert!(!result.is_passive_fiber());

    let signal = result.channel_powers(ChannelCategory::Signal);
    let pump = result.channel_powers(ChannelCategory::CoPump);
    assert_relative_eq!(signal[(0, 0)], signal_in, max_relative = 1e-3);

    let signal_out = result.output_powers(ChannelCategory::Signal)[0];
    let pump_out = result.output_powers(ChannelCategory::CoPump)[0];
    assert!(signal_out > signal_in);
    assert!(result.signal_gains_db()[0] > 0.0);

    // inverted along the whole fiber, so the signal grows at every node
    let signal_row: Vec<f64> = signal.row(0).iter().copied().collect();
    assert!(signal_row.windows(2).all(|w| w[1] >= w[0] - 1e-12));

    // the pump can only lose power: its inversion threshold is the largest of all channels
    assert!(pump.row(0).iter().zip(pump.row(0).iter().skip(1)).all(|(a, b)| b <= &(a + 1e-9)));

    // every signal photon comes from an absorbed pump photon
    assert!(signal_out - signal_in <= pump_in - pump_out);

    assert!(result.upper_level_fraction().iter().all(|n| (0.0..=1.0).contains(n)));
}

#[test]
fn test_backward_pumped_amplifier_with_ase() {
    let mut simulation = FiberAmplifierSimulation::new(ytterbium_fiber(1.5));
    simulation.add_cw_signal(1040e-9, 0.05, 0.0).unwrap();
    simulation.add_backward_pump(976e-9, 3.0, 0.0).unwrap();
    simulation.add_ase(1010e-9, 1090e-9, 5).unwrap();

    let result = simulation.run(20, 1e-3).unwrap();

    assert_eq!(result.slices().count(ChannelCategory::ForwardAse), 5);
    assert_eq!(result.slices().count(ChannelCategory::BackwardAse), 5);
    assert_eq!(result.powers().nrows(), 12);

    assert!(result.total_ase_output(Direction::Forward) > 0.0);
    assert!(result.total_ase_output(Direction::Backward) > 0.0);
    assert!(result.output_powers(ChannelCategory::Signal)[0] > 0.05);

    // the backward pump enters at z = L
    let pump = result.channel_powers(ChannelCategory::CounterPump);
    assert_relative_eq!(pump[(0, pump.ncols() - 1)], 3.0, max_relative = 1e-6);
}

#[test]
fn test_exponential_guess_reaches_the_same_solution() {
    let run = |shape: SignalGainShape| {
        let parameters = GuessParameters {
            signal_gain_shape: shape,
            ..GuessParameters::default()
        };
        let mut simulation = FiberAmplifierSimulation::new(ytterbium_fiber(1.0))
            .with_guess_parameters(parameters)
            .unwrap();
        simulation.add_cw_signal(1030e-9, 0.01, 0.0).unwrap();
        simulation.add_forward_pump(976e-9, 2.0, 0.0).unwrap();
        simulation.run(20, 1e-4).unwrap()
    };

    let linear = run(SignalGainShape::Linear);
    let exponential = run(SignalGainShape::Exponential);

    assert_relative_eq!(
        linear.output_powers(ChannelCategory::Signal)[0],
        exponential.output_powers(ChannelCategory::Signal)[0],
        max_relative = 1e-3
    );
}

// =================================================================================================
// Raman
// =================================================================================================

#[test]
fn test_raman_conserves_photons() {
    let mut simulation = FiberAmplifierSimulationWithRaman::new(passive_fiber(20.0, 0.0));
    simulation.add_cw_signal(1064e-9, 20.0, 0.0).unwrap();
    simulation.add_raman(SIMULATION_MIN_POWER, true).unwrap();

    let result = simulation.run(20, 1e-3).unwrap();
    assert!(result.backward_raman_allowed());
    assert_eq!(result.slices().count(ChannelCategory::BackwardRaman), 1);

    let raman_out = result.output_powers(ChannelCategory::ForwardRaman)[0];
    let signal_out = result.output_powers(ChannelCategory::Signal)[0];
    assert!(raman_out > 1e-9);
    assert!(signal_out < 20.0);

    let frequencies = simulation.channels().get_frequencies();
    let directions = simulation.channels().get_directions();
    let (flux_in, flux_out) = photon_flux_balance(&result, &frequencies, &directions);
    assert_relative_eq!(flux_in, flux_out, max_relative = 1e-3);
}

#[test]
fn test_pulsed_signal_drives_more_raman() {
    let raman_output = |pulsed: bool| {
        let mut simulation = FiberAmplifierSimulationWithRaman::new(passive_fiber(20.0, 0.0));
        if pulsed {
            simulation.add_pulsed_signal(1064e-9, 5.0, 1e6, 100e-9, 0.0).unwrap();
        } else {
            simulation.add_cw_signal(1064e-9, 5.0, 0.0).unwrap();
        }
        simulation.add_raman(SIMULATION_MIN_POWER, false).unwrap();
        let result = simulation.run(20, 1e-3).unwrap();
        result.output_powers(ChannelCategory::ForwardRaman)[0]
    };

    assert!(raman_output(true) > raman_output(false));
}
