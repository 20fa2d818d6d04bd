//! Solved amplifier
//!
//! A [`SimulationResult`] holds the refined mesh, the power of every channel
//! on it and everything needed to interpret those rows: the slice map, the
//! channel wavelengths and the upper level population.

use nalgebra::{DMatrix, DVector};

use crate::channels::{ChannelCategory, Direction, SliceMap};
use crate::physics::conversions::to_db;

/// Powers along the fiber after a successful solve
///
/// Rows of [`powers`](Self::powers) follow the slice map; columns follow
/// [`z`](Self::z).
#[derive(Debug, Clone)]
pub struct SimulationResult {
    z: DVector<f64>,
    powers: DMatrix<f64>,
    slices: SliceMap,
    wavelengths: Vec<f64>,
    upper_level_fraction: DVector<f64>,
    is_passive_fiber: bool,
    backward_raman_allowed: bool,
    model_name: String,
    solver_name: String,
    solver_iterations: usize,
    max_residual: f64,
}

impl SimulationResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        z: DVector<f64>,
        powers: DMatrix<f64>,
        slices: SliceMap,
        wavelengths: Vec<f64>,
        upper_level_fraction: DVector<f64>,
        is_passive_fiber: bool,
        backward_raman_allowed: bool,
        model_name: &str,
        solver_name: &str,
        solver_iterations: usize,
        max_residual: f64,
    ) -> Self {
        Self {
            z,
            powers,
            slices,
            wavelengths,
            upper_level_fraction,
            is_passive_fiber,
            backward_raman_allowed,
            model_name: model_name.to_string(),
            solver_name: solver_name.to_string(),
            solver_iterations,
            max_residual,
        }
    }

    // ====================================== Raw data =============================================

    /// Positions along the fiber \[m\]
    pub fn z(&self) -> &DVector<f64> {
        &self.z
    }

    /// Channel powers \[W\], shape (channels, nodes)
    pub fn powers(&self) -> &DMatrix<f64> {
        &self.powers
    }

    pub fn slices(&self) -> &SliceMap {
        &self.slices
    }

    /// Center wavelength of every row \[m\]
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// Fraction of ions in the upper level at every node, zero in a passive fiber
    pub fn upper_level_fraction(&self) -> &DVector<f64> {
        &self.upper_level_fraction
    }

    pub fn is_passive_fiber(&self) -> bool {
        self.is_passive_fiber
    }

    pub fn backward_raman_allowed(&self) -> bool {
        self.backward_raman_allowed
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn solver_name(&self) -> &str {
        &self.solver_name
    }

    /// Newton iterations summed over every mesh
    pub fn solver_iterations(&self) -> usize {
        self.solver_iterations
    }

    /// Largest relative collocation residual on the final mesh
    pub fn max_residual(&self) -> f64 {
        self.max_residual
    }

    pub fn nodes(&self) -> usize {
        self.z.len()
    }

    // ====================================== Reporting ============================================

    /// Rows of one category, shape (count, nodes)
    pub fn channel_powers(&self, category: ChannelCategory) -> DMatrix<f64> {
        let range = self.slices.slice(category);
        self.powers.rows(range.start, range.len()).into_owned()
    }

    /// Power leaving the fiber for every channel of a category
    ///
    /// Forward categories exit at z = L, backward ones at z = 0.
    pub fn output_powers(&self, category: ChannelCategory) -> Vec<f64> {
        let column = match category.direction() {
            Direction::Forward => self.powers.ncols() - 1,
            Direction::Backward => 0,
        };
        self.slices
            .slice(category)
            .map(|row| self.powers[(row, column)])
            .collect()
    }

    /// Gain of every signal \[dB\]
    pub fn signal_gains_db(&self) -> Vec<f64> {
        let last = self.powers.ncols() - 1;
        self.slices
            .slice(ChannelCategory::Signal)
            .map(|row| to_db(self.powers[(row, last)] / self.powers[(row, 0)]))
            .collect()
    }

    /// Total ASE leaving the fiber in one direction \[W\]
    pub fn total_ase_output(&self, direction: Direction) -> f64 {
        let category = match direction {
            Direction::Forward => ChannelCategory::ForwardAse,
            Direction::Backward => ChannelCategory::BackwardAse,
        };
        self.output_powers(category).iter().sum()
    }

    /// Sum of every channel at each node \[W\]
    pub fn total_power(&self) -> DVector<f64> {
        self.powers.row_sum().transpose()
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// One signal, one counter pump, one ASE bin per direction on three nodes
    fn sample() -> SimulationResult {
        let slices = SliceMap::from_counts([1, 0, 1, 1, 1, 0, 0]);
        let powers = DMatrix::from_row_slice(
            4,
            3,
            &[
                0.1, 0.5, 1.0, // signal
                0.2, 0.8, 2.0, // counter pump
                0.0, 1e-3, 2e-3, // forward ASE
                4e-3, 1e-3, 0.0, // backward ASE
            ],
        );
        SimulationResult::new(
            DVector::from_vec(vec![0.0, 1.0, 2.0]),
            powers,
            slices,
            vec![1030e-9, 976e-9, 1040e-9, 1040e-9],
            DVector::from_vec(vec![0.3, 0.2, 0.1]),
            false,
            false,
            "Giles",
            "Lobatto IIIA collocation",
            7,
            1e-4,
        )
    }

    #[test]
    fn test_channel_powers_selects_rows() {
        let result = sample();
        let pump = result.channel_powers(ChannelCategory::CounterPump);
        assert_eq!(pump.shape(), (1, 3));
        assert_eq!(pump[(0, 2)], 2.0);
        assert_eq!(result.channel_powers(ChannelCategory::CoPump).nrows(), 0);
    }

    #[test]
    fn test_output_powers_follow_direction() {
        let result = sample();
        assert_eq!(result.output_powers(ChannelCategory::Signal), vec![1.0]);
        assert_eq!(result.output_powers(ChannelCategory::CounterPump), vec![0.2]);
        assert_relative_eq!(result.total_ase_output(Direction::Forward), 2e-3);
        assert_relative_eq!(result.total_ase_output(Direction::Backward), 4e-3);
    }

    #[test]
    fn test_signal_gain() {
        let result = sample();
        let gains = result.signal_gains_db();
        assert_eq!(gains.len(), 1);
        assert_relative_eq!(gains[0], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_total_power() {
        let result = sample();
        let total = result.total_power();
        assert_relative_eq!(total[0], 0.304, epsilon = 1e-12);
        assert_relative_eq!(total[2], 3.002, epsilon = 1e-12);
    }
}
