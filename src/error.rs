//! Crate-wide error type.
//!
//! This is a batch analysis library: every failure surfaces directly to the
//! caller as an `Error` value, with no retry or partial-failure handling.

use thiserror::Error;

/// All errors this crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown Crab reference name passed to the catalog factory.
    ///
    /// The message enumerates the valid choices so callers can show it as-is.
    #[error("invalid reference: {given:?}. Choices: {choices:?}")]
    InvalidReference {
        given: String,
        choices: &'static [&'static str],
    },

    /// A unit string in a mapping could not be parsed.
    #[error("unknown unit: {0:?}")]
    UnknownUnit(String),

    /// `from_mapping` only knows how to rebuild a subset of model kinds.
    #[error("deserialization of model {model:?} is not implemented")]
    NotImplemented { model: String },

    /// A covariance axis entry names a parameter the model does not have.
    #[error("model has no parameter named {name:?}")]
    UnknownParameter { name: String },

    /// Covariance matrix dimension does not match the covariance axis.
    #[error("covariance matrix is {found}x{found}, expected {expected}x{expected}")]
    CovarianceShape { expected: usize, found: usize },

    /// Covariance matrix could not be factorized (not positive definite).
    #[error("covariance matrix error: {0}")]
    Covariance(String),

    /// Per-bin data does not line up with the energy binning.
    #[error("binning mismatch: {counts} counts vs {edges} bin edges")]
    BinningMismatch { counts: usize, edges: usize },

    /// On and background spectra of one observation are binned differently.
    #[error("observation binning mismatch: {on} on bins vs {background} background bins")]
    ObservationBinning { on: usize, background: usize },

    /// An operation needs a field that was not set on construction.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
