//! Tabulated cross-section spectra

use crate::error::{FiberAmpError, FiberAmpResult};
use crate::physics::conversions::wl_to_freq;

/// Cross section σ(ν) tabulated on a frequency grid
///
/// Values are linearly interpolated in frequency. Outside the table the cross
/// section is zero, and negative table entries are clamped to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionSpectrum {
    /// Frequencies in ascending order \[Hz\]
    frequencies: Vec<f64>,
    /// Cross sections \[m²\]
    cross_sections: Vec<f64>,
}

impl CrossSectionSpectrum {
    /// Create from (wavelength \[m\], cross section \[m²\]) pairs
    ///
    /// The pairs may be given in any order.
    pub fn from_wavelengths(wavelengths: &[f64], cross_sections: &[f64]) -> FiberAmpResult<Self> {
        if wavelengths.len() != cross_sections.len() {
            return Err(FiberAmpError::shape(
                "cross-section table",
                wavelengths.len(),
                cross_sections.len(),
            ));
        }
        if wavelengths.len() < 2 {
            return Err(FiberAmpError::invalid(
                "a cross-section spectrum needs at least two points",
            ));
        }
        if let Some(bad) = wavelengths.iter().find(|wl| **wl <= 0.0 || !wl.is_finite()) {
            return Err(FiberAmpError::invalid(format!(
                "cross-section wavelengths must be positive, got {}",
                bad
            )));
        }

        let mut pairs: Vec<(f64, f64)> = wavelengths
            .iter()
            .zip(cross_sections.iter())
            .map(|(wl, cs)| (wl_to_freq(*wl), cs.max(0.0)))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        if pairs.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(FiberAmpError::invalid(
                "cross-section spectrum contains duplicate wavelengths",
            ));
        }

        let (frequencies, cross_sections) = pairs.into_iter().unzip();
        Ok(Self {
            frequencies,
            cross_sections,
        })
    }

    /// Cross section at a frequency \[m²\]
    pub fn at_frequency(&self, frequency: f64) -> f64 {
        let first = self.frequencies[0];
        let last = self.frequencies[self.frequencies.len() - 1];
        if !(frequency >= first && frequency <= last) {
            return 0.0;
        }

        // index of the first grid point strictly above `frequency`
        let upper = self
            .frequencies
            .partition_point(|f| *f <= frequency)
            .min(self.frequencies.len() - 1);
        let lower = upper - 1;

        let (f0, f1) = (self.frequencies[lower], self.frequencies[upper]);
        let (s0, s1) = (self.cross_sections[lower], self.cross_sections[upper]);
        let t = (frequency - f0) / (f1 - f0);
        (s0 + t * (s1 - s0)).max(0.0)
    }

    /// Cross section at a vacuum wavelength \[m²\]
    pub fn at_wavelength(&self, wavelength: f64) -> f64 {
        self.at_frequency(wl_to_freq(wavelength))
    }

    /// Number of tabulated points
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}
