//! The channel registry

use std::sync::Arc;

use tracing::debug;

use crate::channels::{ChannelCategory, Direction, OpticalChannel, SliceMap};
use crate::error::{FiberAmpError, FiberAmpResult};
use crate::fiber::Fiber;
use crate::physics::constants::{RAMAN_FREQUENCY_SHIFT, RAMAN_GAIN_BANDWIDTH};

/// Ordered collection of every channel of a simulation
///
/// Channels are appended per category and keep their insertion order inside
/// the category. The registry is mutable until [`Channels::freeze`] is
/// called; afterwards every `add_*` call fails with
/// [`FiberAmpError::ChannelsFrozen`].
#[derive(Debug, Clone)]
pub struct Channels {
    fiber: Arc<dyn Fiber>,
    lists: [Vec<OpticalChannel>; ChannelCategory::COUNT],
    backward_raman_allowed: bool,
    frozen: bool,
}

impl Channels {
    pub fn new(fiber: Arc<dyn Fiber>) -> Self {
        Self {
            fiber,
            lists: Default::default(),
            backward_raman_allowed: false,
            frozen: false,
        }
    }

    pub fn fiber(&self) -> &dyn Fiber {
        self.fiber.as_ref()
    }

    // ====================================== Registration =========================================

    /// Forward single-frequency CW signal
    pub fn add_forward_signal(&mut self, wavelength: f64, power: f64, preset_mfd: f64) -> FiberAmpResult<()> {
        self.ensure_mutable()?;
        let channel = OpticalChannel::single_frequency(
            self.fiber.as_ref(),
            wavelength,
            power,
            preset_mfd,
            Direction::Forward,
        )?;
        self.push(ChannelCategory::Signal, channel);
        Ok(())
    }

    /// Forward signal made of Gaussian pulses
    pub fn add_pulsed_forward_signal(
        &mut self,
        wavelength: f64,
        power: f64,
        repetition_rate: f64,
        fwhm_duration: f64,
        preset_mfd: f64,
    ) -> FiberAmpResult<()> {
        self.ensure_mutable()?;
        let channel = OpticalChannel::pulsed(
            self.fiber.as_ref(),
            wavelength,
            power,
            repetition_rate,
            fwhm_duration,
            preset_mfd,
        )?;
        self.push(ChannelCategory::Signal, channel);
        Ok(())
    }

    /// Pump entering at z = 0
    pub fn add_forward_pump(&mut self, wavelength: f64, power: f64, preset_mfd: f64) -> FiberAmpResult<()> {
        self.ensure_mutable()?;
        let channel = OpticalChannel::single_frequency(
            self.fiber.as_ref(),
            wavelength,
            power,
            preset_mfd,
            Direction::Forward,
        )?;
        self.push(ChannelCategory::CoPump, channel);
        Ok(())
    }

    /// Pump entering at z = L
    pub fn add_backward_pump(&mut self, wavelength: f64, power: f64, preset_mfd: f64) -> FiberAmpResult<()> {
        self.ensure_mutable()?;
        let channel = OpticalChannel::single_frequency(
            self.fiber.as_ref(),
            wavelength,
            power,
            preset_mfd,
            Direction::Backward,
        )?;
        self.push(ChannelCategory::CounterPump, channel);
        Ok(())
    }

    /// ASE band split into `n_bins` forward and `n_bins` backward channels
    ///
    /// Bin centers are evenly spaced from `wl_start` to `wl_end` (both
    /// included) and every bin is `(wl_end - wl_start) / n_bins` wide.
    pub fn add_ase(&mut self, wl_start: f64, wl_end: f64, n_bins: usize) -> FiberAmpResult<()> {
        self.ensure_mutable()?;
        if n_bins == 0 {
            return Err(FiberAmpError::invalid("ASE needs at least one bin"));
        }
        if wl_start <= 0.0 || wl_end <= wl_start {
            return Err(FiberAmpError::invalid(format!(
                "ASE band must satisfy 0 < wl_start < wl_end, got [{}, {}]",
                wl_start, wl_end
            )));
        }

        let wl_bandwidth = (wl_end - wl_start) / n_bins as f64;
        let centers = ase_bin_centers(wl_start, wl_end, n_bins);

        let mut forward = Vec::with_capacity(n_bins);
        let mut backward = Vec::with_capacity(n_bins);
        for wavelength in centers {
            forward.push(OpticalChannel::finite_bandwidth(
                self.fiber.as_ref(),
                wavelength,
                wl_bandwidth,
                0.0,
                0.0,
                Direction::Forward,
            )?);
            backward.push(OpticalChannel::finite_bandwidth(
                self.fiber.as_ref(),
                wavelength,
                wl_bandwidth,
                0.0,
                0.0,
                Direction::Backward,
            )?);
        }

        debug!(n_bins, wl_start, wl_end, "added ASE band");
        self.lists[ChannelCategory::ForwardAse.index()].extend(forward);
        self.lists[ChannelCategory::BackwardAse.index()].extend(backward);
        Ok(())
    }

    /// Raman Stokes channels of the first signal
    ///
    /// One forward channel, plus one backward channel when
    /// `backward_allowed` is set, centered one Raman shift below the first
    /// signal with the Raman gain bandwidth.
    pub fn add_raman(&mut self, input_power: f64, backward_allowed: bool) -> FiberAmpResult<()> {
        self.ensure_mutable()?;
        if input_power < 0.0 || !input_power.is_finite() {
            return Err(FiberAmpError::invalid(format!(
                "Raman input power must be non-negative, got {}",
                input_power
            )));
        }
        if !self.category(ChannelCategory::ForwardRaman).is_empty() {
            return Err(FiberAmpError::invalid("Raman channels were already added"));
        }
        let signal = self.category(ChannelCategory::Signal).first().ok_or_else(|| {
            FiberAmpError::invalid("Raman channels need a signal: add a signal first")
        })?;

        let frequency = signal.frequency() - RAMAN_FREQUENCY_SHIFT;
        if frequency <= 0.0 {
            return Err(FiberAmpError::invalid(format!(
                "signal frequency {} Hz is below the Raman shift",
                signal.frequency()
            )));
        }
        let preset_mfd = signal.mode_field_diameter();

        let forward = OpticalChannel::from_frequency_band(
            self.fiber.as_ref(),
            frequency,
            RAMAN_GAIN_BANDWIDTH,
            input_power,
            preset_mfd,
            Direction::Forward,
        );
        self.push(ChannelCategory::ForwardRaman, forward);

        if backward_allowed {
            let backward = OpticalChannel::from_frequency_band(
                self.fiber.as_ref(),
                frequency,
                RAMAN_GAIN_BANDWIDTH,
                input_power,
                preset_mfd,
                Direction::Backward,
            );
            self.push(ChannelCategory::BackwardRaman, backward);
        }
        self.backward_raman_allowed = backward_allowed;
        Ok(())
    }

    /// Lock the registry and return its slice map
    pub fn freeze(&mut self) -> SliceMap {
        self.frozen = true;
        self.get_slices()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    // ====================================== Queries ==============================================

    /// Current slice map
    pub fn get_slices(&self) -> SliceMap {
        let mut counts = [0; ChannelCategory::COUNT];
        for (count, list) in counts.iter_mut().zip(self.lists.iter()) {
            *count = list.len();
        }
        SliceMap::from_counts(counts)
    }

    /// Channels of one category, in insertion order
    pub fn category(&self, category: ChannelCategory) -> &[OpticalChannel] {
        &self.lists[category.index()]
    }

    /// Every channel, in slice map order
    pub fn iter(&self) -> impl Iterator<Item = &OpticalChannel> + '_ {
        self.lists.iter().flatten()
    }

    pub fn total_count(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Input powers in slice map order \[W\]
    pub fn get_input_powers(&self) -> Vec<f64> {
        self.iter().map(OpticalChannel::input_power).collect()
    }

    /// Center wavelengths in slice map order \[m\]
    pub fn get_wavelengths(&self) -> Vec<f64> {
        self.iter().map(OpticalChannel::wavelength).collect()
    }

    /// Center frequencies in slice map order \[Hz\]
    pub fn get_frequencies(&self) -> Vec<f64> {
        self.iter().map(OpticalChannel::frequency).collect()
    }

    pub fn get_directions(&self) -> Vec<Direction> {
        self.iter().map(OpticalChannel::direction).collect()
    }

    pub fn backward_raman_allowed(&self) -> bool {
        self.backward_raman_allowed
    }

    fn push(&mut self, category: ChannelCategory, channel: OpticalChannel) {
        debug!(
            %category,
            wavelength = channel.wavelength(),
            power = channel.input_power(),
            "added channel"
        );
        self.lists[category.index()].push(channel);
    }

    fn ensure_mutable(&self) -> FiberAmpResult<()> {
        if self.frozen {
            Err(FiberAmpError::ChannelsFrozen)
        } else {
            Ok(())
        }
    }
}

/// `n` evenly spaced points from `start` to `end` inclusive
fn ase_bin_centers(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiber::PassiveFiber;
    use crate::physics::constants::SIMULATION_MIN_POWER;
    use crate::physics::conversions::wl_to_freq;
    use approx::assert_relative_eq;

    fn channels() -> Channels {
        Channels::new(Arc::new(PassiveFiber::new(1.0, 3e-6, 0.12, 0.0).unwrap()))
    }

    #[test]
    fn test_input_powers_follow_slice_order() {
        let mut ch = channels();
        ch.add_backward_pump(976e-9, 3.0, 0.0).unwrap();
        ch.add_forward_signal(1064e-9, 0.1, 0.0).unwrap();
        ch.add_forward_pump(976e-9, 2.0, 0.0).unwrap();

        assert_eq!(ch.get_input_powers(), vec![0.1, 2.0, 3.0]);
        let slices = ch.get_slices();
        assert_eq!(slices.slice(ChannelCategory::CounterPump), 2..3);
        assert_eq!(
            ch.get_directions(),
            vec![Direction::Forward, Direction::Forward, Direction::Backward]
        );
    }

    #[test]
    fn test_ase_bins() {
        let mut ch = channels();
        ch.add_ase(1000e-9, 1100e-9, 5).unwrap();

        let forward = ch.category(ChannelCategory::ForwardAse);
        let backward = ch.category(ChannelCategory::BackwardAse);
        assert_eq!(forward.len(), 5);
        assert_eq!(backward.len(), 5);

        let expected = [1000e-9, 1025e-9, 1050e-9, 1075e-9, 1100e-9];
        for (channel, wl) in forward.iter().zip(expected) {
            assert_relative_eq!(channel.wavelength(), wl, max_relative = 1e-12);
            let dnu = crate::physics::conversions::wl_bw_to_freq_bw(20e-9, wl);
            assert_relative_eq!(channel.frequency_bandwidth(), dnu, max_relative = 1e-12);
            assert_eq!(channel.input_power(), SIMULATION_MIN_POWER);
        }
        assert!(backward.iter().all(|c| c.direction() == Direction::Backward));
    }

    #[test]
    fn test_invalid_ase_band() {
        let mut ch = channels();
        assert!(ch.add_ase(1100e-9, 1000e-9, 5).is_err());
        assert!(ch.add_ase(1000e-9, 1100e-9, 0).is_err());
    }

    #[test]
    fn test_raman_requires_signal() {
        let mut ch = channels();
        assert!(matches!(
            ch.add_raman(0.0, true),
            Err(FiberAmpError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_raman_channels() {
        let mut ch = channels();
        ch.add_forward_signal(1064e-9, 1.0, 0.0).unwrap();
        ch.add_raman(0.0, false).unwrap();

        let raman = ch.category(ChannelCategory::ForwardRaman);
        assert_eq!(raman.len(), 1);
        assert!(ch.category(ChannelCategory::BackwardRaman).is_empty());
        assert!(!ch.backward_raman_allowed());
        assert_relative_eq!(
            raman[0].frequency(),
            wl_to_freq(1064e-9) - RAMAN_FREQUENCY_SHIFT,
            max_relative = 1e-12
        );
        assert_eq!(raman[0].frequency_bandwidth(), RAMAN_GAIN_BANDWIDTH);
    }

    #[test]
    fn test_frozen_registry_rejects_additions() {
        let mut ch = channels();
        ch.add_forward_signal(1064e-9, 1.0, 0.0).unwrap();
        let slices = ch.freeze();
        assert_eq!(slices.total(), 1);
        assert!(matches!(
            ch.add_forward_pump(976e-9, 1.0, 0.0),
            Err(FiberAmpError::ChannelsFrozen)
        ));
    }
}
