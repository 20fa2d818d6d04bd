//! Two-point boundary conditions
//!
//! # Design
//!
//! A boundary condition is a residual g(y(0), y(L)) with one row per state
//! variable. Every row additionally reports which end it pins. The solver
//! uses that to place the row next to the mesh node it touches, which keeps
//! the global Newton system banded.

use std::fmt;

use nalgebra::DVector;

use crate::channels::{Channels, Direction};

// =================================================================================================
// Boundary Side
// =================================================================================================

/// End of the fiber a boundary row depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundarySide {
    /// z = 0
    Start,
    /// z = L
    End,
}

impl From<Direction> for BoundarySide {
    /// Channels are pinned at their entry end
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => BoundarySide::Start,
            Direction::Backward => BoundarySide::End,
        }
    }
}

// =================================================================================================
// Boundary Conditions Trait
// =================================================================================================

/// Residual function of a two-point boundary value problem
pub trait BoundaryConditions: Send + Sync + fmt::Debug {
    /// Number of residual rows (= state dimension)
    fn dimension(&self) -> usize;

    /// g(y(0), y(L)), zero when the conditions hold
    fn residual(&self, start: &DVector<f64>, end: &DVector<f64>) -> DVector<f64>;

    /// For every residual row, the end it depends on
    ///
    /// Row i may only read `start` when `sides()[i]` is `Start` and only
    /// `end` when it is `End`.
    fn sides(&self) -> Vec<BoundarySide>;
}

// =================================================================================================
// Basic Boundary Conditions
// =================================================================================================

/// Every channel starts with its input power at its entry end
///
/// Forward channels: `y(0)[i] - P_in[i]`. Backward channels:
/// `y(L)[i] - P_in[i]`. Input powers come from the registry, already floored,
/// so no row ever pins a power to exactly zero.
#[derive(Debug, Clone)]
pub struct BasicBoundaryConditions {
    input_powers: DVector<f64>,
    sides: Vec<BoundarySide>,
}

impl BasicBoundaryConditions {
    pub fn new(channels: &Channels) -> Self {
        Self {
            input_powers: DVector::from_vec(channels.get_input_powers()),
            sides: channels
                .get_directions()
                .into_iter()
                .map(BoundarySide::from)
                .collect(),
        }
    }

    pub fn input_powers(&self) -> &DVector<f64> {
        &self.input_powers
    }
}

impl BoundaryConditions for BasicBoundaryConditions {
    fn dimension(&self) -> usize {
        self.input_powers.len()
    }

    fn residual(&self, start: &DVector<f64>, end: &DVector<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.dimension(),
            self.sides.iter().enumerate().map(|(i, side)| match side {
                BoundarySide::Start => start[i] - self.input_powers[i],
                BoundarySide::End => end[i] - self.input_powers[i],
            }),
        )
    }

    fn sides(&self) -> Vec<BoundarySide> {
        self.sides.clone()
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiber::PassiveFiber;
    use std::sync::Arc;

    fn channels() -> Channels {
        let mut channels = Channels::new(Arc::new(PassiveFiber::new(1.0, 3e-6, 0.12, 0.0).unwrap()));
        channels.add_forward_signal(1064e-9, 0.5, 0.0).unwrap();
        channels.add_backward_pump(976e-9, 2.0, 0.0).unwrap();
        channels.add_ase(1000e-9, 1100e-9, 1).unwrap();
        channels
    }

    #[test]
    fn test_residual_is_zero_at_truth() {
        let bc = BasicBoundaryConditions::new(&channels());
        let inputs = bc.input_powers().clone();

        // free ends hold arbitrary values
        let mut start = inputs.clone();
        let mut end = inputs.clone();
        start[1] = 123.0;
        end[0] = 0.25;
        start[3] = 7.0;
        end[2] = 3.0;

        assert_eq!(bc.residual(&start, &end), DVector::zeros(4));
    }

    #[test]
    fn test_sides_follow_directions() {
        let bc = BasicBoundaryConditions::new(&channels());
        assert_eq!(
            bc.sides(),
            vec![
                BoundarySide::Start,
                BoundarySide::End,
                BoundarySide::Start,
                BoundarySide::End
            ]
        );
    }

    #[test]
    fn test_residual_values() {
        let bc = BasicBoundaryConditions::new(&channels());
        let start = DVector::from_vec(vec![0.75, 0.0, 0.0, 0.0]);
        let end = DVector::from_vec(vec![0.0, 1.5, 0.0, 0.0]);
        let residual = bc.residual(&start, &end);
        assert_eq!(residual[0], 0.25);
        assert_eq!(residual[1], -0.5);
    }
}
