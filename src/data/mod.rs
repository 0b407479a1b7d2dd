//! Energy-binned and pointwise data containers.
//!
//! These are the observational collaborators the result types consume:
//!
//! - counts spectra (per-bin counts over energy bin edges)
//! - on/off observations with a background estimate
//! - flux-point tables (measured differential fluxes with upper errors)

pub mod counts;
pub mod flux_points;

pub use counts::*;
pub use flux_points::*;
