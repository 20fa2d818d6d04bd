//! Optical channel records

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FiberAmpError, FiberAmpResult};
use crate::fiber::Fiber;
use crate::physics::constants::SIMULATION_MIN_POWER;
use crate::physics::conversions::{freq_to_wl, gaussian_peak_power_ratio, wl_bw_to_freq_bw, wl_to_freq};

// =================================================================================================
// Direction
// =================================================================================================

/// Propagation direction along z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Enters at z = 0
    Forward,
    /// Enters at z = L
    Backward,
}

impl Direction {
    /// +1 for forward, -1 for backward
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

// =================================================================================================
// Optical Channel
// =================================================================================================

/// One propagating frequency channel
///
/// The fiber-dependent coefficients are evaluated once, when the channel is
/// created, and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticalChannel {
    /// Center frequency ν \[Hz\]
    frequency: f64,
    /// Frequency bandwidth Δν \[Hz\], 0 for single-frequency channels
    frequency_bandwidth: f64,
    /// Input power at the entry end \[W\], never below the power floor
    input_power: f64,
    direction: Direction,
    /// Mode field diameter \[m\]
    mode_field_diameter: f64,
    /// Gain coefficient g \[1/m\]
    gain_coefficient: f64,
    /// Absorption coefficient α \[1/m\]
    absorption_coefficient: f64,
    /// Background loss \[1/m\]
    background_loss: f64,
    /// Peak-to-average power ratio (1 for CW light)
    peak_power_ratio: f64,
}

impl OpticalChannel {
    /// Single-frequency channel at wavelength `wavelength`
    ///
    /// `preset_mfd` of zero lets the fiber choose the mode field diameter.
    pub fn single_frequency(
        fiber: &dyn Fiber,
        wavelength: f64,
        power: f64,
        preset_mfd: f64,
        direction: Direction,
    ) -> FiberAmpResult<Self> {
        validate_wavelength(wavelength)?;
        validate_power(power)?;

        let frequency = wl_to_freq(wavelength);
        let mode_field_diameter = fiber.mode_field_diameter(frequency, preset_mfd);
        let mode_field_radius = mode_field_diameter / 2.0;

        Ok(Self {
            frequency,
            frequency_bandwidth: 0.0,
            input_power: power.max(SIMULATION_MIN_POWER),
            direction,
            mode_field_diameter,
            gain_coefficient: fiber.channel_gain(frequency, mode_field_radius),
            absorption_coefficient: fiber.channel_absorption(frequency, mode_field_radius),
            background_loss: fiber.background_loss(),
            peak_power_ratio: 1.0,
        })
    }

    /// Finite-bandwidth channel centered at `wavelength` with width `wl_bandwidth`
    pub fn finite_bandwidth(
        fiber: &dyn Fiber,
        wavelength: f64,
        wl_bandwidth: f64,
        power: f64,
        preset_mfd: f64,
        direction: Direction,
    ) -> FiberAmpResult<Self> {
        validate_wavelength(wavelength)?;
        validate_power(power)?;
        if wl_bandwidth < 0.0 || !wl_bandwidth.is_finite() {
            return Err(FiberAmpError::invalid(format!(
                "channel bandwidth must be non-negative, got {}",
                wl_bandwidth
            )));
        }

        let frequency = wl_to_freq(wavelength);
        let frequency_bandwidth = wl_bw_to_freq_bw(wl_bandwidth, wavelength);
        Ok(Self::from_frequency_band(
            fiber,
            frequency,
            frequency_bandwidth,
            power,
            preset_mfd,
            direction,
        ))
    }

    /// Finite-bandwidth channel given directly in frequency
    pub(crate) fn from_frequency_band(
        fiber: &dyn Fiber,
        frequency: f64,
        frequency_bandwidth: f64,
        power: f64,
        preset_mfd: f64,
        direction: Direction,
    ) -> Self {
        let mode_field_diameter = fiber.mode_field_diameter(frequency, preset_mfd);
        let mode_field_radius = mode_field_diameter / 2.0;

        Self {
            frequency,
            frequency_bandwidth,
            input_power: power.max(SIMULATION_MIN_POWER),
            direction,
            mode_field_diameter,
            gain_coefficient: fiber.finite_bandwidth_gain(frequency, frequency_bandwidth, mode_field_radius),
            absorption_coefficient: fiber.finite_bandwidth_absorption(frequency, frequency_bandwidth, mode_field_radius),
            background_loss: fiber.background_loss(),
            peak_power_ratio: 1.0,
        }
    }

    /// Single-frequency forward channel carrying Gaussian pulses
    pub fn pulsed(
        fiber: &dyn Fiber,
        wavelength: f64,
        power: f64,
        repetition_rate: f64,
        fwhm_duration: f64,
        preset_mfd: f64,
    ) -> FiberAmpResult<Self> {
        if repetition_rate <= 0.0 || fwhm_duration <= 0.0 {
            return Err(FiberAmpError::invalid(format!(
                "repetition rate and pulse duration must be positive, got {} and {}",
                repetition_rate, fwhm_duration
            )));
        }
        let ratio = gaussian_peak_power_ratio(repetition_rate, fwhm_duration);
        if ratio < 1.0 {
            return Err(FiberAmpError::invalid(format!(
                "pulses of {} s at {} Hz overlap: duty cycle above one",
                fwhm_duration, repetition_rate
            )));
        }

        let mut channel = Self::single_frequency(fiber, wavelength, power, preset_mfd, Direction::Forward)?;
        channel.peak_power_ratio = ratio;
        Ok(channel)
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn frequency_bandwidth(&self) -> f64 {
        self.frequency_bandwidth
    }

    /// Vacuum wavelength of the center frequency \[m\]
    pub fn wavelength(&self) -> f64 {
        freq_to_wl(self.frequency)
    }

    pub fn input_power(&self) -> f64 {
        self.input_power
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn mode_field_diameter(&self) -> f64 {
        self.mode_field_diameter
    }

    pub fn gain_coefficient(&self) -> f64 {
        self.gain_coefficient
    }

    pub fn absorption_coefficient(&self) -> f64 {
        self.absorption_coefficient
    }

    pub fn background_loss(&self) -> f64 {
        self.background_loss
    }

    pub fn peak_power_ratio(&self) -> f64 {
        self.peak_power_ratio
    }
}

fn validate_wavelength(wavelength: f64) -> FiberAmpResult<()> {
    if wavelength <= 0.0 || !wavelength.is_finite() {
        return Err(FiberAmpError::invalid(format!(
            "wavelength must be positive, got {}",
            wavelength
        )));
    }
    Ok(())
}

fn validate_power(power: f64) -> FiberAmpResult<()> {
    if power < 0.0 || !power.is_finite() {
        return Err(FiberAmpError::invalid(format!(
            "input power must be non-negative, got {}",
            power
        )));
    }
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
