//! Unit-aware quantities for spectral analysis.
//!
//! This is deliberately not a general unit system. The crate only ever deals
//! with three physical dimensions:
//!
//! - energy (TeV, GeV, keV, erg)
//! - differential flux (`cm^-2 s^-1 E^-1` for some energy unit `E`)
//! - integral energy flux (`erg cm^-2 s^-1`, fixed)
//!
//! Each gets its own type, so mixing dimensions is a compile error, and all
//! conversions are explicit (`to` / `to_value`). Ratios of same-dimension
//! quantities reconcile units first and come out as plain `f64`.

pub mod energy;
pub mod flux;

pub use energy::*;
pub use flux::*;
