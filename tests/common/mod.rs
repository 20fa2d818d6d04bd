//! Common utilities for integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_models;
pub mod test_helpers;

// Re-export commonly used items
pub use fixtures::{passive_fiber, ytterbium_fiber};
pub use mock_models::{CounterPropagatingPair, ExponentialDecay, PinnedInputs};
pub use test_helpers::{create_scenario, linspace, photon_flux_balance, relative_error};
