//! Undoped fiber

use std::f64::consts::PI;

use crate::error::{FiberAmpError, FiberAmpResult};
use crate::fiber::{EffectiveAreaType, Fiber};
use crate::physics::conversions::{effective_area_from_mfd, freq_to_wl, fundamental_mode_mfd_petermann_2};

/// Fiber without a gain medium
///
/// Every channel is only attenuated by the background loss. Useful for
/// Raman-only studies and as a reference case.
#[derive(Debug, Clone)]
pub struct PassiveFiber {
    length: f64,
    core_radius: f64,
    core_na: f64,
    background_loss: f64,
    effective_area_type: EffectiveAreaType,
}

impl PassiveFiber {
    pub fn new(length: f64, core_radius: f64, core_na: f64, background_loss: f64) -> FiberAmpResult<Self> {
        if length <= 0.0 || !length.is_finite() {
            return Err(FiberAmpError::invalid(format!(
                "fiber length must be positive, got {}",
                length
            )));
        }
        if core_radius <= 0.0 || core_na <= 0.0 {
            return Err(FiberAmpError::invalid(format!(
                "core radius and NA must be positive, got {} and {}",
                core_radius, core_na
            )));
        }
        if background_loss < 0.0 {
            return Err(FiberAmpError::invalid(format!(
                "background loss cannot be negative, got {}",
                background_loss
            )));
        }

        Ok(Self {
            length,
            core_radius,
            core_na,
            background_loss,
            effective_area_type: EffectiveAreaType::CoreArea,
        })
    }

    /// Select the nonlinear effective area model
    pub fn with_effective_area_type(mut self, effective_area_type: EffectiveAreaType) -> FiberAmpResult<Self> {
        effective_area_type.ensure_implemented()?;
        self.effective_area_type = effective_area_type;
        Ok(self)
    }
}

impl Fiber for PassiveFiber {
    fn length(&self) -> f64 {
        self.length
    }

    fn background_loss(&self) -> f64 {
        self.background_loss
    }

    fn is_passive_fiber(&self) -> bool {
        true
    }

    fn channel_gain(&self, _frequency: f64, _mode_field_radius: f64) -> f64 {
        0.0
    }

    fn channel_absorption(&self, _frequency: f64, _mode_field_radius: f64) -> f64 {
        0.0
    }

    fn mode_field_diameter(&self, frequency: f64, preset_mfd: f64) -> f64 {
        if preset_mfd > 0.0 {
            preset_mfd
        } else {
            fundamental_mode_mfd_petermann_2(freq_to_wl(frequency), self.core_radius, self.core_na)
        }
    }

    fn saturation_parameter(&self) -> f64 {
        0.0
    }

    fn nonlinear_effective_area(&self, frequency: f64) -> FiberAmpResult<f64> {
        match self.effective_area_type {
            EffectiveAreaType::CoreArea => Ok(PI * self.core_radius * self.core_radius),
            EffectiveAreaType::Gaussian => Ok(effective_area_from_mfd(
                freq_to_wl(frequency),
                self.core_radius,
                self.core_na,
            )),
            EffectiveAreaType::Bessel => Err(FiberAmpError::NotImplemented(
                "effective area from the Bessel mode distribution".to_string(),
            )),
        }
    }
}
