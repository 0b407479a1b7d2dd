//! Counts spectra and on/off observations.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::units::{Energy, EnergyUnit};

/// Per-bin counts over a contiguous energy binning.
///
/// Invariant: `energy_edges.len() == counts.len() + 1`, checked at
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountsSpectrum {
    counts: Vec<f64>,
    energy_edges: Vec<Energy>,
}

impl CountsSpectrum {
    pub fn new(counts: Vec<f64>, energy_edges: Vec<Energy>) -> Result<Self, Error> {
        if energy_edges.len() != counts.len() + 1 {
            return Err(Error::BinningMismatch {
                counts: counts.len(),
                edges: energy_edges.len(),
            });
        }
        Ok(Self {
            counts,
            energy_edges,
        })
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn energy_edges(&self) -> &[Energy] {
        &self.energy_edges
    }

    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Logarithmic bin centers, in TeV.
    pub fn energy_centers(&self) -> Vec<Energy> {
        self.energy_edges
            .windows(2)
            .map(|pair| {
                let lo = pair[0].to_value(EnergyUnit::Tev);
                let hi = pair[1].to_value(EnergyUnit::Tev);
                Energy::tev((lo * hi).sqrt())
            })
            .collect()
    }
}

/// An on/off observation: detected on-counts plus a background estimate on
/// the same binning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumObservation {
    on_vector: CountsSpectrum,
    background_vector: CountsSpectrum,
}

impl SpectrumObservation {
    pub fn new(
        on_vector: CountsSpectrum,
        background_vector: CountsSpectrum,
    ) -> Result<Self, Error> {
        if on_vector.n_bins() != background_vector.n_bins() {
            return Err(Error::ObservationBinning {
                on: on_vector.n_bins(),
                background: background_vector.n_bins(),
            });
        }
        Ok(Self {
            on_vector,
            background_vector,
        })
    }

    pub fn on_vector(&self) -> &CountsSpectrum {
        &self.on_vector
    }

    pub fn background_vector(&self) -> &CountsSpectrum {
        &self.background_vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn edges(values: &[f64]) -> Vec<Energy> {
        values.iter().map(|&v| Energy::tev(v)).collect()
    }

    #[test]
    fn edge_count_invariant_is_checked() {
        let err = CountsSpectrum::new(vec![1.0, 2.0], edges(&[1.0, 2.0])).unwrap_err();
        assert!(matches!(err, Error::BinningMismatch { counts: 2, edges: 2 }));
    }

    #[test]
    fn log_centers() {
        let spec = CountsSpectrum::new(vec![5.0], edges(&[1.0, 4.0])).unwrap();
        let centers = spec.energy_centers();
        assert_eq!(centers.len(), 1);
        assert_relative_eq!(centers[0].to_value(EnergyUnit::Tev), 2.0);
    }

    #[test]
    fn observation_requires_matching_binning() {
        let on = CountsSpectrum::new(vec![1.0, 2.0], edges(&[1.0, 2.0, 4.0])).unwrap();
        let bkg = CountsSpectrum::new(vec![1.0], edges(&[1.0, 2.0])).unwrap();
        let err = SpectrumObservation::new(on, bkg).unwrap_err();
        assert!(matches!(err, Error::ObservationBinning { on: 2, background: 1 }));
        assert!(err.to_string().contains("2 on bins vs 1 background bins"));
    }

    #[test]
    fn total_counts() {
        let spec = CountsSpectrum::new(vec![1.0, 2.5], edges(&[1.0, 2.0, 4.0])).unwrap();
        assert_relative_eq!(spec.total(), 3.5);
    }
}
