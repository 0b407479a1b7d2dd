//! `crab-spectra` library crate.
//!
//! Building blocks for gamma-ray spectral analysis:
//!
//! - parametric spectral models (power law, cutoff power law, log parabola)
//!   plus the published Crab Nebula reference spectra used as a standard candle
//! - fit-result containers with a plain-mapping (YAML-compatible) serialization
//! - derived analysis products: predicted counts and flux-point residuals with
//!   first-order correlated-uncertainty propagation
//!
//! Everything is synchronous and in-memory. There is no CLI, network, or
//! plotting surface in this crate.

pub mod data;
pub mod error;
pub mod math;
pub mod models;
pub mod results;
pub mod units;

pub use error::Error;
