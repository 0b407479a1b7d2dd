//! Measured flux points.

use serde::{Deserialize, Serialize};

use crate::units::{DiffFlux, Energy};

/// One measured differential-flux value at one energy, with its upper error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxPoint {
    pub energy: Energy,
    pub diff_flux: DiffFlux,
    pub diff_flux_err_hi: DiffFlux,
}

/// An ordered table of flux points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FluxPointTable {
    points: Vec<FluxPoint>,
}

impl FluxPointTable {
    pub fn new(points: Vec<FluxPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[FluxPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FluxPoint> {
        self.points.iter()
    }
}
