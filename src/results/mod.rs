//! Results of a spectral fit and the products derived from them.
//!
//! This module defines:
//!
//! - [`SpectrumFitResult`]: the fitted model plus covariance, fit range,
//!   statistic, predicted counts and derived fluxes, with a plain-mapping
//!   (YAML-compatible) serialization
//! - [`SpectrumResult`]: a fit result combined with an observation and flux
//!   points, exposing predicted on-counts and flux-point residuals

pub mod fit_result;
pub mod spectrum;

pub use fit_result::*;
pub use spectrum::*;
