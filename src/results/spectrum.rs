//! Combined fit + observation + flux points, and the derived products.

use log::debug;

use crate::data::{CountsSpectrum, FluxPointTable, SpectrumObservation};
use crate::error::Error;
use crate::math::UFloat;
use crate::results::fit_result::SpectrumFitResult;
use crate::units::{DiffFluxUnit, EnergyUnit};

/// All results of one spectral analysis, gathered for reporting.
///
/// Constructed after the fit; everything interesting is derived, not stored.
#[derive(Debug)]
pub struct SpectrumResult {
    pub fit: SpectrumFitResult,
    pub obs: SpectrumObservation,
    pub points: FluxPointTable,
}

impl SpectrumResult {
    pub fn new(fit: SpectrumFitResult, obs: SpectrumObservation, points: FluxPointTable) -> Self {
        Self { fit, obs, points }
    }

    /// On counts expected under the best fit: background estimate plus the
    /// model-predicted source counts, per bin.
    ///
    /// Bins where the sum is NaN (e.g. zero-exposure bins) are set to zero so
    /// the spectrum stays usable downstream.
    pub fn expected_on_counts(&self) -> Result<CountsSpectrum, Error> {
        let npred = self.fit.npred().ok_or(Error::MissingField("npred"))?;
        let background = self.obs.background_vector();
        if npred.len() != background.n_bins() {
            return Err(Error::BinningMismatch {
                counts: npred.len(),
                edges: background.n_bins() + 1,
            });
        }

        let counts = background
            .counts()
            .iter()
            .zip(npred)
            .map(|(bkg, pred)| {
                let total = bkg + pred;
                if total.is_nan() { 0.0 } else { total }
            })
            .collect();
        CountsSpectrum::new(counts, background.energy_edges().to_vec())
    }

    /// Per-point residuals `(observed - model) / observed`, one per flux
    /// point in table order.
    ///
    /// The observed upper error enters as an independent error source on top
    /// of the shared fit-parameter sources, so each residual carries the
    /// combined uncertainty.
    pub fn flux_point_residuals(&self) -> Result<Vec<UFloat>, Error> {
        let model = self.fit.model_with_uncertainties()?;
        // Point-local sources go after the shared parameter sources.
        let n_shared = self.fit.covar_axis().len();
        let per_kev = DiffFluxUnit::per_kev();
        debug!("computing residuals for {} flux points", self.points.len());

        let mut residuals = Vec::with_capacity(self.points.len());
        for (i, point) in self.points.iter().enumerate() {
            let energy_kev = point.energy.to_value(EnergyUnit::Kev);
            // Each measurement gets its own source; only the model parameters
            // are shared across points.
            let observed = UFloat::independent(
                point.diff_flux.to_value(per_kev),
                point.diff_flux_err_hi.to_value(per_kev),
                n_shared + i,
            );
            let predicted = model.evaluate_kev(energy_kev);
            residuals.push(&(&observed - &predicted) / &observed);
        }
        Ok(residuals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FluxPoint;
    use crate::models::{PowerLaw, SpectralModel};
    use crate::units::{DiffFlux, Energy};
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn edges(values: &[f64]) -> Vec<Energy> {
        values.iter().map(|&v| Energy::tev(v)).collect()
    }

    fn observation() -> SpectrumObservation {
        let on = CountsSpectrum::new(vec![25.0, 12.0, 4.0], edges(&[1.0, 2.0, 4.0, 8.0])).unwrap();
        let bkg = CountsSpectrum::new(vec![5.0, 3.0, 1.0], edges(&[1.0, 2.0, 4.0, 8.0])).unwrap();
        SpectrumObservation::new(on, bkg).unwrap()
    }

    fn fitted_power_law() -> SpectrumFitResult {
        let model = SpectralModel::PowerLaw(PowerLaw {
            amplitude: DiffFlux::per_cm2_s_tev(3.45e-11),
            index: 2.63,
            reference: Energy::tev(1.0),
        });
        SpectrumFitResult::new(model, Some((Energy::tev(1.0), Energy::tev(8.0))))
            .with_covariance(
                DMatrix::from_row_slice(1, 1, &[1.0e-42]),
                vec!["amplitude".to_string()],
            )
            .unwrap()
    }

    #[test]
    fn expected_on_counts_adds_background_and_npred() {
        let fit = fitted_power_law().with_npred(vec![18.0, 8.0, 2.0]);
        let result = SpectrumResult::new(fit, observation(), FluxPointTable::default());
        let expected = result.expected_on_counts().unwrap();
        assert_eq!(expected.counts(), &[23.0, 11.0, 3.0]);
    }

    #[test]
    fn expected_on_counts_zeroes_nan_bins() {
        let fit = fitted_power_law().with_npred(vec![18.0, f64::NAN, 2.0]);
        let result = SpectrumResult::new(fit, observation(), FluxPointTable::default());
        let expected = result.expected_on_counts().unwrap();
        assert_eq!(expected.counts()[1], 0.0);
    }

    #[test]
    fn expected_on_counts_requires_npred() {
        let result =
            SpectrumResult::new(fitted_power_law(), observation(), FluxPointTable::default());
        assert!(matches!(
            result.expected_on_counts(),
            Err(Error::MissingField("npred"))
        ));
    }

    #[test]
    fn expected_on_counts_checks_binning() {
        let fit = fitted_power_law().with_npred(vec![18.0, 8.0]);
        let result = SpectrumResult::new(fit, observation(), FluxPointTable::default());
        assert!(matches!(
            result.expected_on_counts(),
            Err(Error::BinningMismatch { .. })
        ));
    }

    #[test]
    fn residual_is_zero_when_point_matches_model() {
        let fit = fitted_power_law();
        let energy = Energy::tev(2.0);
        let model_flux = fit.model().evaluate(energy);
        let points = FluxPointTable::new(vec![FluxPoint {
            energy,
            diff_flux: model_flux,
            diff_flux_err_hi: DiffFlux::new(model_flux.value * 0.1, model_flux.unit),
        }]);

        let result = SpectrumResult::new(fit, observation(), points);
        let residuals = result.flux_point_residuals().unwrap();
        assert_eq!(residuals.len(), 1);
        assert_relative_eq!(residuals[0].nominal(), 0.0, epsilon = 1e-12);
        // The model and point uncertainties still propagate into the residual.
        assert!(residuals[0].std_dev() > 0.0);
    }

    #[test]
    fn residuals_of_separate_points_are_not_fully_correlated() {
        // Two identical, independently measured points: their measurement
        // errors must not cancel when the residuals are combined.
        let fit = fitted_power_law();
        let energy = Energy::tev(2.0);
        let model_flux = fit.model().evaluate(energy);
        let point = FluxPoint {
            energy,
            diff_flux: model_flux,
            diff_flux_err_hi: DiffFlux::new(model_flux.value * 0.1, model_flux.unit),
        };
        let points = FluxPointTable::new(vec![point, point]);

        let result = SpectrumResult::new(fit, observation(), points);
        let residuals = result.flux_point_residuals().unwrap();
        let diff = &residuals[0] - &residuals[1];
        assert_relative_eq!(diff.nominal(), 0.0, epsilon = 1e-12);
        // Shared model-parameter sources cancel in the difference, the two
        // independent measurement sources add in quadrature.
        assert!(diff.std_dev() > 0.5 * residuals[0].std_dev());
    }

    #[test]
    fn residuals_follow_table_order_and_sign() {
        let fit = fitted_power_law();
        let energy = Energy::tev(2.0);
        let model_flux = fit.model().evaluate(energy);
        let high = DiffFlux::new(model_flux.value * 2.0, model_flux.unit);
        let low = DiffFlux::new(model_flux.value * 0.5, model_flux.unit);
        let err = DiffFlux::new(model_flux.value * 0.1, model_flux.unit);
        let points = FluxPointTable::new(vec![
            FluxPoint {
                energy,
                diff_flux: high,
                diff_flux_err_hi: err,
            },
            FluxPoint {
                energy,
                diff_flux: low,
                diff_flux_err_hi: err,
            },
        ]);

        let result = SpectrumResult::new(fit, observation(), points);
        let residuals = result.flux_point_residuals().unwrap();
        // (2m - m) / 2m = 0.5 and (m/2 - m) / (m/2) = -1.
        assert_relative_eq!(residuals[0].nominal(), 0.5, max_relative = 1e-12);
        assert_relative_eq!(residuals[1].nominal(), -1.0, max_relative = 1e-12);
    }
}
