//! Fibers shared by the integration tests

use fiberamp::fiber::{ActiveFiber, CrossSectionSpectrum, PassiveFiber};

/// Undoped fiber with a 3 µm core radius and NA 0.12
pub fn passive_fiber(length: f64, background_loss: f64) -> PassiveFiber {
    PassiveFiber::new(length, 3e-6, 0.12, background_loss).unwrap()
}

/// Yb-like cross sections: strong and equal around 976 nm,
/// emission-dominated above 1010 nm
pub fn ytterbium_spectra() -> (CrossSectionSpectrum, CrossSectionSpectrum) {
    let wavelengths = [960e-9, 990e-9, 1010e-9, 1100e-9];
    let absorption =
        CrossSectionSpectrum::from_wavelengths(&wavelengths, &[2.5e-24, 2.5e-24, 5e-27, 0.0]).unwrap();
    let gain =
        CrossSectionSpectrum::from_wavelengths(&wavelengths, &[2.5e-24, 2.5e-24, 6e-25, 1e-25]).unwrap();
    (absorption, gain)
}

/// Core-pumped Yb fiber: 1 ms lifetime, 1e25 ions/m³, overlap 0.8
pub fn ytterbium_fiber(length: f64) -> ActiveFiber {
    let (absorption, gain) = ytterbium_spectra();
    ActiveFiber::new(length, absorption, gain, 3e-6, 1e-3, 1e25, 0.0, 0.12)
        .unwrap()
        .use_constant_overlap(0.8)
        .unwrap()
}
