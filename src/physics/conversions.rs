//! Unit conversions and fiber waveguide approximations
//!
//! Small free functions shared by the fiber collaborators and the channel
//! factories. Wavelengths and radii are in meters, frequencies in hertz.

use std::f64::consts::PI;

use super::constants::{PLANCK_CONSTANT, SPEED_OF_LIGHT};

/// Vacuum wavelength to optical frequency
pub fn wl_to_freq(wavelength: f64) -> f64 {
    SPEED_OF_LIGHT / wavelength
}

/// Optical frequency to vacuum wavelength
pub fn freq_to_wl(frequency: f64) -> f64 {
    SPEED_OF_LIGHT / frequency
}

/// Wavelength bandwidth Δλ around λ to frequency bandwidth Δν = c·Δλ/λ²
pub fn wl_bw_to_freq_bw(wl_bandwidth: f64, center_wavelength: f64) -> f64 {
    SPEED_OF_LIGHT * wl_bandwidth / (center_wavelength * center_wavelength)
}

/// Photon energy hν \[J\]
pub fn photon_energy(frequency: f64) -> f64 {
    PLANCK_CONSTANT * frequency
}

/// Normalized frequency V = 2π·a·NA/λ of a step-index fiber
pub fn normalized_frequency(wavelength: f64, core_radius: f64, core_na: f64) -> f64 {
    2.0 * PI * core_radius * core_na / wavelength
}

/// Mode field diameter of the fundamental mode (Petermann II approximation)
///
/// ```text
/// w = a · (0.65 + 1.619 V^-1.5 + 2.879 V^-6 - (0.016 + 1.561 V^-7))
/// MFD = 2w
/// ```
pub fn fundamental_mode_mfd_petermann_2(wavelength: f64, core_radius: f64, core_na: f64) -> f64 {
    let v = normalized_frequency(wavelength, core_radius, core_na);
    let w = core_radius
        * (0.65 + 1.619 / v.powf(1.5) + 2.879 / v.powi(6) - (0.016 + 1.561 / v.powi(7)));
    2.0 * w
}

/// Power fraction of a Gaussian mode of radius `mode_field_radius` inside a
/// uniformly doped disc of radius `doped_radius`
pub fn overlap_integral(doped_radius: f64, mode_field_radius: f64) -> f64 {
    1.0 - (-2.0 * doped_radius * doped_radius / (mode_field_radius * mode_field_radius)).exp()
}

/// Effective area π·w² of a Gaussian mode with the Petermann II radius
pub fn effective_area_from_mfd(wavelength: f64, core_radius: f64, core_na: f64) -> f64 {
    let radius = fundamental_mode_mfd_petermann_2(wavelength, core_radius, core_na) / 2.0;
    PI * radius * radius
}

/// Peak-to-average power ratio of a train of Gaussian pulses
///
/// A Gaussian pulse of FWHM duration τ carries E = P_peak·τ·√(π/(4 ln 2)),
/// so P_peak / P_avg = √(4 ln 2 / π) / (f_rep·τ).
pub fn gaussian_peak_power_ratio(repetition_rate: f64, fwhm_duration: f64) -> f64 {
    (4.0 * std::f64::consts::LN_2 / PI).sqrt() / (repetition_rate * fwhm_duration)
}

/// Power ratio to decibels
pub fn to_db(ratio: f64) -> f64 {
    10.0 * ratio.log10()
}
