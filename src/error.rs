//! Error types
//!
//! Every fallible operation of the crate returns [`FiberAmpResult`]. Numerical
//! guards (power floors) never raise errors: they clamp and carry on. Errors are
//! reserved for invalid configuration, shape mismatches between the channel
//! registry and the arrays built from it, and solver failures.

use thiserror::Error;

use crate::solver::SolverStatus;

#[derive(Error, Debug)]
pub enum FiberAmpError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Channel registry is frozen: channels cannot be added after the simulation has run")]
    ChannelsFrozen,

    #[error("Shape mismatch in {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: String,
        expected: String,
        found: String,
    },

    #[error("BVP solver failed ({status}) with {nodes} nodes: {message}")]
    SolverFailure {
        status: SolverStatus,
        nodes: usize,
        message: String,
    },

    #[error("Non-finite value in {what} at index {index}")]
    NonFinite { what: String, index: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl FiberAmpError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub(crate) fn shape(what: impl Into<String>, expected: impl ToString, found: impl ToString) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

pub type FiberAmpResult<T> = Result<T, FiberAmpError>;
