//! Container for the result of a spectral fit.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::debug;
use nalgebra::DMatrix;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::math::{UFloat, correlated_values};
use crate::models::{PowerLaw, SpectralModel, UncertainSpectralModel};
use crate::units::{DiffFlux, DiffFluxUnit, Energy, EnergyUnit};

/// Result of a spectral fit, produced by an external fitting routine.
///
/// Read-only after construction; the uncertain-model variant is derived
/// lazily on first access and cached for the life of the value.
#[derive(Debug)]
pub struct SpectrumFitResult {
    model: SpectralModel,
    covariance: Option<DMatrix<f64>>,
    covar_axis: Vec<String>,
    /// Stored normalized to TeV.
    fit_range: Option<(Energy, Energy)>,
    statname: Option<String>,
    statval: Option<f64>,
    /// On counts predicted by the fitted model, per energy bin.
    npred: Option<Vec<f64>>,
    /// Model flux at labelled energies (e.g. "1TeV"), with matching errors.
    fluxes: Option<BTreeMap<String, DiffFlux>>,
    flux_errors: Option<BTreeMap<String, DiffFlux>>,
    uncertain_model: OnceCell<UncertainSpectralModel>,
}

impl SpectrumFitResult {
    pub fn new(model: SpectralModel, fit_range: Option<(Energy, Energy)>) -> Self {
        let fit_range =
            fit_range.map(|(lo, hi)| (lo.to(EnergyUnit::Tev), hi.to(EnergyUnit::Tev)));
        Self {
            model,
            covariance: None,
            covar_axis: Vec::new(),
            fit_range,
            statname: None,
            statval: None,
            npred: None,
            fluxes: None,
            flux_errors: None,
            uncertain_model: OnceCell::new(),
        }
    }

    /// Attach the fit covariance over an ordered parameter axis.
    ///
    /// The matrix must be square with one row per axis entry.
    pub fn with_covariance(
        mut self,
        matrix: DMatrix<f64>,
        axis: Vec<String>,
    ) -> Result<Self, Error> {
        if matrix.nrows() != axis.len() || matrix.ncols() != axis.len() {
            return Err(Error::CovarianceShape {
                expected: axis.len(),
                found: matrix.nrows(),
            });
        }
        self.covariance = Some(matrix);
        self.covar_axis = axis;
        Ok(self)
    }

    pub fn with_statistic(mut self, statname: impl Into<String>, statval: f64) -> Self {
        self.statname = Some(statname.into());
        self.statval = Some(statval);
        self
    }

    pub fn with_npred(mut self, npred: Vec<f64>) -> Self {
        self.npred = Some(npred);
        self
    }

    pub fn with_fluxes(
        mut self,
        fluxes: BTreeMap<String, DiffFlux>,
        flux_errors: BTreeMap<String, DiffFlux>,
    ) -> Self {
        self.fluxes = Some(fluxes);
        self.flux_errors = Some(flux_errors);
        self
    }

    pub fn model(&self) -> &SpectralModel {
        &self.model
    }

    pub fn covariance(&self) -> Option<&DMatrix<f64>> {
        self.covariance.as_ref()
    }

    pub fn covar_axis(&self) -> &[String] {
        &self.covar_axis
    }

    pub fn fit_range(&self) -> Option<(Energy, Energy)> {
        self.fit_range
    }

    pub fn statname(&self) -> Option<&str> {
        self.statname.as_deref()
    }

    pub fn statval(&self) -> Option<f64> {
        self.statval
    }

    pub fn npred(&self) -> Option<&[f64]> {
        self.npred.as_deref()
    }

    pub fn fluxes(&self) -> Option<&BTreeMap<String, DiffFlux>> {
        self.fluxes.as_ref()
    }

    pub fn flux_errors(&self) -> Option<&BTreeMap<String, DiffFlux>> {
        self.flux_errors.as_ref()
    }

    /// The fitted model with parameters as correlated uncertain values.
    ///
    /// Parameters on the covariance axis become correlated [`UFloat`]s; the
    /// rest pass through as exact values. Everything is converted to a fixed
    /// unit set first (energies in keV, amplitudes in `cm^-2 s^-1 keV^-1`),
    /// because the covariance is only meaningful in one consistent unit
    /// convention. Computed once and cached.
    pub fn model_with_uncertainties(&self) -> Result<&UncertainSpectralModel, Error> {
        self.uncertain_model
            .get_or_try_init(|| self.build_uncertain_model())
    }

    fn build_uncertain_model(&self) -> Result<UncertainSpectralModel, Error> {
        let covariance = self
            .covariance
            .as_ref()
            .ok_or(Error::MissingField("covariance"))?;
        if self.covar_axis.is_empty() {
            return Err(Error::MissingField("covar_axis"));
        }
        debug!(
            "building uncertain {} over axis {:?}",
            self.model.name(),
            self.covar_axis
        );

        let mut values = Vec::with_capacity(self.covar_axis.len());
        for name in &self.covar_axis {
            let value = parameter_in_kev(&self.model, name)
                .ok_or_else(|| Error::UnknownParameter { name: name.clone() })?;
            values.push(value);
        }
        let correlated = correlated_values(&values, covariance)?;
        let by_name: BTreeMap<&str, UFloat> = self
            .covar_axis
            .iter()
            .map(String::as_str)
            .zip(correlated)
            .collect();

        let take = |name: &str| -> Result<UFloat, Error> {
            if let Some(u) = by_name.get(name) {
                return Ok(u.clone());
            }
            parameter_in_kev(&self.model, name)
                .map(UFloat::exact)
                .ok_or_else(|| Error::UnknownParameter {
                    name: name.to_string(),
                })
        };

        match &self.model {
            SpectralModel::PowerLaw(_) => Ok(UncertainSpectralModel::PowerLaw {
                amplitude: take("amplitude")?,
                index: take("index")?,
                reference: take("reference")?,
            }),
            SpectralModel::ExpCutoffPowerLaw(_) => Ok(UncertainSpectralModel::ExpCutoffPowerLaw {
                amplitude: take("amplitude")?,
                index: take("index")?,
                lambda: take("lambda")?,
                reference: take("reference")?,
            }),
            SpectralModel::LogParabola(_) => Ok(UncertainSpectralModel::LogParabola {
                amplitude: take("amplitude")?,
                alpha: take("alpha")?,
                beta: take("beta")?,
                reference: take("reference")?,
            }),
            // No free parameters, so the axis lookup above has already failed.
            SpectralModel::MeyerCrab(_) => Err(Error::UnknownParameter {
                name: self.covar_axis[0].clone(),
            }),
        }
    }

    /// Plain-data representation; only currently-set fields are emitted.
    pub fn to_mapping(&self) -> FitResultMapping {
        let fluxes = self.fluxes.as_ref().map(|fluxes| {
            fluxes
                .iter()
                .map(|(label, flux)| {
                    let error = self
                        .flux_errors
                        .as_ref()
                        .and_then(|errors| errors.get(label))
                        .map(|err| err.to_value(flux.unit));
                    (
                        label.clone(),
                        FluxMapping {
                            value: flux.value,
                            unit: flux.unit.label(),
                            error,
                        },
                    )
                })
                .collect()
        });

        FitResultMapping {
            model: ModelMapping {
                name: self.model.name().to_string(),
                parameters: self.model.parameters(),
            },
            fit_range: self.fit_range.map(|(lo, hi)| RangeMapping {
                min: lo.value,
                max: hi.value,
                unit: lo.unit.label().to_string(),
            }),
            statval: self.statval,
            statname: self.statname.clone(),
            covariance: self.covariance.as_ref().map(|matrix| CovarianceMapping {
                matrix: (0..matrix.nrows())
                    .map(|i| (0..matrix.ncols()).map(|j| matrix[(i, j)]).collect())
                    .collect(),
                axis: self.covar_axis.clone(),
            }),
            fluxes,
        }
    }

    /// Rebuild a fit result from its mapping representation.
    ///
    /// Only power-law models are supported; the statistic and covariance are
    /// not restored. Missing optional keys mean "field absent".
    pub fn from_mapping(mapping: &FitResultMapping) -> Result<Self, Error> {
        if mapping.model.name != "PowerLaw" {
            return Err(Error::NotImplemented {
                model: mapping.model.name.clone(),
            });
        }

        let parameter = |name: &'static str| {
            mapping
                .model
                .parameters
                .iter()
                .find(|p| p.name == name)
                .ok_or(Error::MissingField(name))
        };

        let amplitude = parameter("amplitude")?;
        let amplitude_unit = amplitude
            .unit
            .as_deref()
            .ok_or(Error::MissingField("amplitude unit"))?;
        let reference = parameter("reference")?;
        let reference_unit = reference
            .unit
            .as_deref()
            .ok_or(Error::MissingField("reference unit"))?;
        let model = SpectralModel::PowerLaw(PowerLaw {
            amplitude: DiffFlux::new(amplitude.value, DiffFluxUnit::parse(amplitude_unit)?),
            index: parameter("index")?.value,
            reference: Energy::new(reference.value, EnergyUnit::parse(reference_unit)?),
        });

        let fit_range = match &mapping.fit_range {
            Some(range) => {
                let unit = EnergyUnit::parse(&range.unit)?;
                Some((Energy::new(range.min, unit), Energy::new(range.max, unit)))
            }
            None => None,
        };

        let mut result = Self::new(model, fit_range);
        if let Some(fluxes) = &mapping.fluxes {
            let mut values = BTreeMap::new();
            let mut errors = BTreeMap::new();
            for (label, entry) in fluxes {
                let unit = DiffFluxUnit::parse(&entry.unit)?;
                values.insert(label.clone(), DiffFlux::new(entry.value, unit));
                if let Some(error) = entry.error {
                    errors.insert(label.clone(), DiffFlux::new(error, unit));
                }
            }
            result = result.with_fluxes(values, errors);
        }
        Ok(result)
    }

    /// Write the mapping representation to a YAML file.
    pub fn to_yaml(&self, path: &Path) -> Result<(), Error> {
        let text = serde_yaml::to_string(&self.to_mapping())?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Read a fit result back from a YAML file.
    pub fn from_yaml(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        let mapping: FitResultMapping = serde_yaml::from_str(&text)?;
        Self::from_mapping(&mapping)
    }
}

impl fmt::Display for SpectrumFitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit result info")?;
        writeln!(f, "---------------")?;
        writeln!(f, "Model: {}", self.model.name())?;
        for p in self.model.parameters() {
            match &p.unit {
                Some(unit) => writeln!(f, "  {}: {} {}", p.name, p.value, unit)?,
                None => writeln!(f, "  {}: {}", p.name, p.value)?,
            }
        }
        if let (Some(statval), Some(statname)) = (self.statval, &self.statname) {
            writeln!(f, "Statistic: {statval:.3} ({statname})")?;
        }
        if let Some(covariance) = &self.covariance {
            writeln!(f, "Covariance: {:?} {}", self.covar_axis, covariance)?;
        }
        if let Some((lo, hi)) = self.fit_range {
            writeln!(f, "Fit Range: [{}, {}] {}", lo.value, hi.value, lo.unit)?;
        }
        Ok(())
    }
}

/// Best-fit parameter value converted to the fixed keV unit set.
///
/// Returns `None` when the model has no parameter of that name (always, for
/// the Meyer model).
fn parameter_in_kev(model: &SpectralModel, name: &str) -> Option<f64> {
    let per_kev = DiffFluxUnit::per_kev();
    match model {
        SpectralModel::PowerLaw(m) => match name {
            "amplitude" => Some(m.amplitude.to_value(per_kev)),
            "index" => Some(m.index),
            "reference" => Some(m.reference.to_value(EnergyUnit::Kev)),
            _ => None,
        },
        SpectralModel::ExpCutoffPowerLaw(m) => match name {
            "amplitude" => Some(m.amplitude.to_value(per_kev)),
            "index" => Some(m.index),
            // TeV^-1 to keV^-1.
            "lambda" => Some(m.lambda * EnergyUnit::Kev.in_tev()),
            "reference" => Some(m.reference.to_value(EnergyUnit::Kev)),
            _ => None,
        },
        SpectralModel::LogParabola(m) => match name {
            "amplitude" => Some(m.amplitude.to_value(per_kev)),
            "alpha" => Some(m.alpha),
            "beta" => Some(m.beta),
            "reference" => Some(m.reference.to_value(EnergyUnit::Kev)),
            _ => None,
        },
        SpectralModel::MeyerCrab(_) => None,
    }
}

/// Plain-data (YAML-compatible) representation of a fit result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResultMapping {
    pub model: ModelMapping,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fit_range: Option<RangeMapping>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub statval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub statname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub covariance: Option<CovarianceMapping>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fluxes: Option<BTreeMap<String, FluxMapping>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMapping {
    pub name: String,
    pub parameters: Vec<crate::models::Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeMapping {
    pub min: f64,
    pub max: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovarianceMapping {
    /// Row-major.
    pub matrix: Vec<Vec<f64>>,
    pub axis: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxMapping {
    pub value: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogParabola, MeyerCrabModel};
    use approx::assert_relative_eq;

    fn power_law() -> SpectralModel {
        SpectralModel::PowerLaw(PowerLaw {
            amplitude: DiffFlux::per_cm2_s_tev(3.45e-11),
            index: 2.63,
            reference: Energy::tev(1.0),
        })
    }

    fn power_law_result() -> SpectrumFitResult {
        let mut fluxes = BTreeMap::new();
        fluxes.insert("1TeV".to_string(), DiffFlux::per_cm2_s_tev(3.45e-11));
        let mut flux_errors = BTreeMap::new();
        flux_errors.insert("1TeV".to_string(), DiffFlux::per_cm2_s_tev(1.0e-12));
        SpectrumFitResult::new(power_law(), Some((Energy::tev(1.0), Energy::tev(10.0))))
            .with_statistic("cash", 32.5)
            .with_fluxes(fluxes, flux_errors)
    }

    #[test]
    fn fit_range_is_normalized_to_tev() {
        let result = SpectrumFitResult::new(
            power_law(),
            Some((Energy::new(500.0, EnergyUnit::Gev), Energy::tev(10.0))),
        );
        let (lo, hi) = result.fit_range().unwrap();
        assert_eq!(lo.unit, EnergyUnit::Tev);
        assert_relative_eq!(lo.value, 0.5);
        assert_relative_eq!(hi.value, 10.0);
    }

    #[test]
    fn covariance_shape_is_checked() {
        let err = SpectrumFitResult::new(power_law(), None)
            .with_covariance(
                DMatrix::from_row_slice(1, 1, &[1.0]),
                vec!["amplitude".to_string(), "index".to_string()],
            )
            .unwrap_err();
        assert!(matches!(err, Error::CovarianceShape { expected: 2, found: 1 }));
    }

    #[test]
    fn mapping_round_trips_fit_range_and_fluxes() {
        let result = power_law_result();
        let restored = SpectrumFitResult::from_mapping(&result.to_mapping()).unwrap();

        assert_eq!(restored.fit_range(), result.fit_range());
        let fluxes = restored.fluxes().unwrap();
        assert_relative_eq!(fluxes["1TeV"].value, 3.45e-11);
        assert_eq!(fluxes["1TeV"].unit, DiffFluxUnit::per_tev());
        let errors = restored.flux_errors().unwrap();
        assert_relative_eq!(errors["1TeV"].value, 1.0e-12);
    }

    #[test]
    fn mapping_omits_absent_fields() {
        let mapping = SpectrumFitResult::new(power_law(), None).to_mapping();
        assert!(mapping.fit_range.is_none());
        assert!(mapping.statval.is_none());
        assert!(mapping.covariance.is_none());
        assert!(mapping.fluxes.is_none());
        let restored = SpectrumFitResult::from_mapping(&mapping).unwrap();
        assert!(restored.fit_range().is_none());
        assert!(restored.fluxes().is_none());
        assert!(restored.flux_errors().is_none());
    }

    #[test]
    fn from_mapping_rejects_other_model_kinds() {
        let result = SpectrumFitResult::new(
            SpectralModel::LogParabola(LogParabola {
                amplitude: DiffFlux::per_cm2_s_tev(3.23e-11),
                alpha: 2.47,
                beta: 0.1,
                reference: Energy::tev(1.0),
            }),
            None,
        );
        let err = SpectrumFitResult::from_mapping(&result.to_mapping()).unwrap_err();
        assert!(matches!(err, Error::NotImplemented { .. }));
    }

    #[test]
    fn yaml_file_round_trip() {
        let path = std::env::temp_dir().join("crab_spectra_fit_result_test.yaml");
        let result = power_law_result();
        result.to_yaml(&path).unwrap();
        let restored = SpectrumFitResult::from_yaml(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.fit_range(), result.fit_range());
        assert_relative_eq!(restored.fluxes().unwrap()["1TeV"].value, 3.45e-11);
    }

    #[test]
    fn uncertain_model_matches_deterministic_nominal() {
        let sigma = 2.0e-21_f64; // in cm-2 s-1 keV-1
        let result = SpectrumFitResult::new(power_law(), None)
            .with_covariance(
                DMatrix::from_row_slice(1, 1, &[sigma * sigma]),
                vec!["amplitude".to_string()],
            )
            .unwrap();

        let uncertain = result.model_with_uncertainties().unwrap();
        let reference_kev = 1.0e9;
        let f = uncertain.evaluate_kev(reference_kev);

        let deterministic = result
            .model()
            .evaluate(Energy::tev(1.0))
            .to_value(DiffFluxUnit::per_kev());
        assert_relative_eq!(f.nominal(), deterministic, max_relative = 1e-12);
        assert_relative_eq!(f.std_dev(), sigma, max_relative = 1e-12);
    }

    #[test]
    fn uncertain_model_is_cached() {
        let result = SpectrumFitResult::new(power_law(), None)
            .with_covariance(DMatrix::from_row_slice(1, 1, &[1e-42]), vec![
                "amplitude".to_string(),
            ])
            .unwrap();
        let first = result.model_with_uncertainties().unwrap();
        let second = result.model_with_uncertainties().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn unknown_covar_axis_parameter_fails() {
        let result = SpectrumFitResult::new(power_law(), None)
            .with_covariance(DMatrix::from_row_slice(1, 1, &[1.0]), vec![
                "curvature".to_string(),
            ])
            .unwrap();
        let err = result.model_with_uncertainties().unwrap_err();
        assert!(matches!(err, Error::UnknownParameter { .. }));
    }

    #[test]
    fn meyer_model_has_nothing_to_propagate() {
        let result = SpectrumFitResult::new(SpectralModel::MeyerCrab(MeyerCrabModel), None)
            .with_covariance(DMatrix::from_row_slice(1, 1, &[1.0]), vec![
                "amplitude".to_string(),
            ])
            .unwrap();
        assert!(result.model_with_uncertainties().is_err());
    }

    #[test]
    fn display_summarizes_the_fit() {
        let text = power_law_result().to_string();
        assert!(text.contains("Fit result info"));
        assert!(text.contains("Model: PowerLaw"));
        assert!(text.contains("Statistic: 32.500 (cash)"));
        assert!(text.contains("Fit Range: [1, 10] TeV"));
    }
}
