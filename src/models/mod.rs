//! Spectral model implementations.
//!
//! Models are a closed sum type with pure evaluation functions, so result and
//! residual code can match exhaustively instead of dispatching on strings.

pub mod crab;
pub mod model;
pub mod uncertain;

pub use crab::*;
pub use model::*;
pub use uncertain::*;
