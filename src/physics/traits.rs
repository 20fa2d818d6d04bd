//! Rate-equation model trait
//!
//! This module defines the core API between the physics and the numerics:
//! - `RateEquationModel`: the spatial derivative dP/dz = f(z, P) of a channel set
//!
//! The power array convention is shared by the whole crate: one row per
//! channel (ordered by the slice map), one column per position z.

use nalgebra::{DMatrix, DVector};

// =================================================================================================
// Rate Equation Model Trait
// =================================================================================================

/// Trait for steady-state propagation models
///
/// # Responsibility
/// Computes the spatial derivative of every channel power at given positions.
/// Does NOT solve the boundary-value problem (that's the solver's job).
///
/// The model provides the "physics" (equations), the solver provides
/// the "numerics" (method to solve them).
///
/// # Vectorization
/// `derivative` receives a whole mesh at once: `z` has one entry per column of
/// `powers`. Implementations must return a matrix with the same shape as
/// `powers` and must not branch on exact equality of powers, so that
/// finite-difference Jacobians stay meaningful.
pub trait RateEquationModel: Send + Sync {
    /// Number of channels (rows of the power array)
    fn dimension(&self) -> usize;

    /// Computes dP/dz at every column of `powers`
    ///
    /// # Arguments
    /// * `z` - Positions along the fiber \[m\], one per column
    /// * `powers` - Channel powers \[W\], shape (dimension, z.len())
    fn derivative(&self, z: &DVector<f64>, powers: &DMatrix<f64>) -> DMatrix<f64>;

    /// Fraction of dopant ions in the upper laser level at every column
    ///
    /// Passive fibers return zeros.
    fn upper_level_fraction(&self, powers: &DMatrix<f64>) -> DVector<f64>;

    /// Name of the model (used for display and logging)
    fn name(&self) -> &str;
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Uniform attenuation dP/dz = -α·P
    struct Attenuation {
        channels: usize,
        alpha: f64,
    }

    impl RateEquationModel for Attenuation {
        fn dimension(&self) -> usize {
            self.channels
        }

        fn derivative(&self, _z: &DVector<f64>, powers: &DMatrix<f64>) -> DMatrix<f64> {
            powers * (-self.alpha)
        }

        fn upper_level_fraction(&self, powers: &DMatrix<f64>) -> DVector<f64> {
            DVector::zeros(powers.ncols())
        }

        fn name(&self) -> &str {
            "Attenuation"
        }
    }

    #[test]
    fn test_model_is_object_safe() {
        let model: Box<dyn RateEquationModel> = Box::new(Attenuation { channels: 2, alpha: 0.5 });
        let z = DVector::from_vec(vec![0.0, 1.0, 2.0]);
        let powers = DMatrix::from_element(2, 3, 2.0);

        let derivative = model.derivative(&z, &powers);

        assert_eq!(derivative.shape(), (2, 3));
        assert_eq!(derivative[(1, 2)], -1.0);
        assert_eq!(model.upper_level_fraction(&powers).len(), 3);
        assert_eq!(model.name(), "Attenuation");
    }
}
