//! Rare-earth-doped fiber

use std::f64::consts::PI;

use crate::error::{FiberAmpError, FiberAmpResult};
use crate::fiber::{CrossSectionSpectrum, EffectiveAreaType, Fiber, Overlap};
use crate::physics::conversions::{
    effective_area_from_mfd, freq_to_wl, fundamental_mode_mfd_petermann_2, overlap_integral,
};

/// Doped step-index fiber with tabulated gain and absorption cross sections
///
/// The doped region is assumed to coincide with the core.
#[derive(Debug, Clone)]
pub struct ActiveFiber {
    // ==================== Geometry ====================
    /// Fiber length L \[m\]
    length: f64,
    /// Core radius a \[m\]
    core_radius: f64,
    /// Core numerical aperture
    core_na: f64,

    // ==================== Spectroscopy ====================
    /// Absorption cross section σₐ(ν)
    absorption_spectrum: CrossSectionSpectrum,
    /// Emission (gain) cross section σₑ(ν)
    gain_spectrum: CrossSectionSpectrum,
    /// Upper state lifetime τ \[s\]
    upper_state_lifetime: f64,
    /// Dopant number density n_t \[1/m³\]
    ion_number_density: f64,

    // ==================== Losses and modes ====================
    /// Background loss \[1/m\]
    background_loss: f64,
    overlap: Overlap,
    effective_area_type: EffectiveAreaType,
}

impl ActiveFiber {
    /// Create a new doped fiber
    ///
    /// # Arguments
    ///
    /// * `length` - Fiber length \[m\]
    /// * `absorption_spectrum` - Absorption cross section σₐ
    /// * `gain_spectrum` - Emission cross section σₑ
    /// * `core_radius` - Core (and doped region) radius \[m\]
    /// * `upper_state_lifetime` - Spontaneous lifetime τ \[s\]
    /// * `ion_number_density` - Dopant density n_t \[1/m³\]
    /// * `background_loss` - Background loss \[1/m\]
    /// * `core_na` - Core numerical aperture
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        length: f64,
        absorption_spectrum: CrossSectionSpectrum,
        gain_spectrum: CrossSectionSpectrum,
        core_radius: f64,
        upper_state_lifetime: f64,
        ion_number_density: f64,
        background_loss: f64,
        core_na: f64,
    ) -> FiberAmpResult<Self> {
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
        if upper_state_lifetime <= 0.0 {
            return Err(FiberAmpError::invalid(format!(
                "upper state lifetime must be positive, got {}",
                upper_state_lifetime
            )));
        }
        if ion_number_density < 0.0 || background_loss < 0.0 {
            return Err(FiberAmpError::invalid(
                "dopant density and background loss cannot be negative",
            ));
        }

        Ok(Self {
            length,
            core_radius,
            core_na,
            absorption_spectrum,
            gain_spectrum,
            upper_state_lifetime,
            ion_number_density,
            background_loss,
            overlap: Overlap::Automatic,
            effective_area_type: EffectiveAreaType::CoreArea,
        })
    }

    /// Use the same overlap for every channel
    pub fn use_constant_overlap(mut self, overlap: f64) -> FiberAmpResult<Self> {
        if !(0.0..=1.0).contains(&overlap) {
            return Err(FiberAmpError::invalid(format!(
                "overlap must be in [0, 1], got {}",
                overlap
            )));
        }
        self.overlap = Overlap::Constant(overlap);
        Ok(self)
    }

    /// Compute the overlap from each channel's mode field radius
    pub fn use_automatic_overlap(mut self) -> Self {
        self.overlap = Overlap::Automatic;
        self
    }

    /// Select the nonlinear effective area model
    ///
    /// Fails immediately for models that are not implemented.
    pub fn with_effective_area_type(mut self, effective_area_type: EffectiveAreaType) -> FiberAmpResult<Self> {
        effective_area_type.ensure_implemented()?;
        self.effective_area_type = effective_area_type;
        Ok(self)
    }

    pub fn core_radius(&self) -> f64 {
        self.core_radius
    }

    pub fn core_na(&self) -> f64 {
        self.core_na
    }

    pub fn ion_number_density(&self) -> f64 {
        self.ion_number_density
    }

    pub fn upper_state_lifetime(&self) -> f64 {
        self.upper_state_lifetime
    }

    pub fn overlap(&self) -> Overlap {
        self.overlap
    }

    /// Geometric core area π·a² \[m²\]
    pub fn core_area(&self) -> f64 {
        PI * self.core_radius * self.core_radius
    }

    fn channel_overlap(&self, frequency: f64, mode_field_radius: f64) -> f64 {
        match self.overlap {
            Overlap::Constant(value) => value,
            Overlap::Automatic if mode_field_radius > 0.0 => {
                overlap_integral(self.core_radius, mode_field_radius)
            }
            Overlap::Automatic => {
                let radius = fundamental_mode_mfd_petermann_2(freq_to_wl(frequency), self.core_radius, self.core_na) / 2.0;
                overlap_integral(self.core_radius, radius)
            }
        }
    }
}

impl Fiber for ActiveFiber {
    fn length(&self) -> f64 {
        self.length
    }

    fn background_loss(&self) -> f64 {
        self.background_loss
    }

    fn is_passive_fiber(&self) -> bool {
        self.ion_number_density <= 0.0
    }

    fn channel_gain(&self, frequency: f64, mode_field_radius: f64) -> f64 {
        self.gain_spectrum.at_frequency(frequency)
            * self.channel_overlap(frequency, mode_field_radius)
            * self.ion_number_density
    }

    fn channel_absorption(&self, frequency: f64, mode_field_radius: f64) -> f64 {
        self.absorption_spectrum.at_frequency(frequency)
            * self.channel_overlap(frequency, mode_field_radius)
            * self.ion_number_density
    }

    fn mode_field_diameter(&self, frequency: f64, preset_mfd: f64) -> f64 {
        if preset_mfd > 0.0 {
            preset_mfd
        } else {
            fundamental_mode_mfd_petermann_2(freq_to_wl(frequency), self.core_radius, self.core_na)
        }
    }

    fn saturation_parameter(&self) -> f64 {
        self.core_area() * self.ion_number_density / self.upper_state_lifetime
    }

    fn nonlinear_effective_area(&self, frequency: f64) -> FiberAmpResult<f64> {
        match self.effective_area_type {
            EffectiveAreaType::CoreArea => Ok(self.core_area()),
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

// =================================================================================================
// Tests
// =================================================================================================
