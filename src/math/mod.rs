//! Mathematical utilities: first-order correlated-uncertainty propagation.

pub mod uncertainty;

pub use uncertainty::*;
