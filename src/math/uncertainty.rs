//! First-order (delta-method) propagation of correlated uncertainties.
//!
//! A [`UFloat`] is a nominal value plus a vector of sensitivities to a basis
//! of independent, unit-variance error sources. Arithmetic propagates the
//! sensitivities with the standard first-order rules, so:
//!
//! - the standard deviation of any derived value is the Euclidean norm of its
//!   sensitivity vector
//! - correlations between values sharing sources are tracked exactly
//!   (to first order), e.g. `x - x` has zero uncertainty
//!
//! Correlated fit parameters are created from a covariance matrix via its
//! Cholesky factor: parameter `i` gets row `i` of `L` as sensitivities, which
//! reproduces `cov = L Lᵀ`.
//!
//! Sensitivity vectors of different lengths are reconciled by treating the
//! missing tail as zeros. Within one computation, sources are ordered: shared
//! (parameter) sources first, any computation-local source after them.

use nalgebra::DMatrix;

use crate::error::Error;

/// A value with first-order propagated uncertainty.
#[derive(Debug, Clone, PartialEq)]
pub struct UFloat {
    nominal: f64,
    derivs: Vec<f64>,
}

impl UFloat {
    /// A value with no uncertainty at all.
    pub fn exact(nominal: f64) -> Self {
        Self {
            nominal,
            derivs: Vec::new(),
        }
    }

    /// A value with one independent error source at basis index `offset`.
    pub fn independent(nominal: f64, std_dev: f64, offset: usize) -> Self {
        let mut derivs = vec![0.0; offset + 1];
        derivs[offset] = std_dev;
        Self { nominal, derivs }
    }

    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    /// Propagated standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.derivs.iter().map(|d| d * d).sum::<f64>().sqrt()
    }

    /// Chain rule for a unary function: scale every sensitivity by `df`.
    fn map(&self, value: f64, df: f64) -> Self {
        Self {
            nominal: value,
            derivs: self.derivs.iter().map(|d| df * d).collect(),
        }
    }

    /// Combine two sensitivity vectors as `fa*da + fb*db`, zero-extending the
    /// shorter one.
    fn combine(a: &[f64], fa: f64, b: &[f64], fb: f64) -> Vec<f64> {
        let n = a.len().max(b.len());
        (0..n)
            .map(|i| {
                let da = a.get(i).copied().unwrap_or(0.0);
                let db = b.get(i).copied().unwrap_or(0.0);
                fa * da + fb * db
            })
            .collect()
    }

    pub fn exp(&self) -> Self {
        let v = self.nominal.exp();
        self.map(v, v)
    }

    pub fn ln(&self) -> Self {
        self.map(self.nominal.ln(), 1.0 / self.nominal)
    }

    /// `self^k` for an exact exponent.
    pub fn powf(&self, k: f64) -> Self {
        let v = self.nominal.powf(k);
        self.map(v, k * self.nominal.powf(k - 1.0))
    }

    /// `self^other` with both base and exponent uncertain.
    ///
    /// `d(a^b) = b a^(b-1) da + a^b ln(a) db`; requires a positive base, which
    /// holds for the energy ratios this crate raises to powers.
    pub fn pow(&self, other: &UFloat) -> Self {
        let a = self.nominal;
        let b = other.nominal;
        let v = a.powf(b);
        Self {
            nominal: v,
            derivs: Self::combine(&self.derivs, b * a.powf(b - 1.0), &other.derivs, v * a.ln()),
        }
    }
}

impl std::ops::Add<&UFloat> for &UFloat {
    type Output = UFloat;

    fn add(self, rhs: &UFloat) -> UFloat {
        UFloat {
            nominal: self.nominal + rhs.nominal,
            derivs: UFloat::combine(&self.derivs, 1.0, &rhs.derivs, 1.0),
        }
    }
}

impl std::ops::Sub<&UFloat> for &UFloat {
    type Output = UFloat;

    fn sub(self, rhs: &UFloat) -> UFloat {
        UFloat {
            nominal: self.nominal - rhs.nominal,
            derivs: UFloat::combine(&self.derivs, 1.0, &rhs.derivs, -1.0),
        }
    }
}

impl std::ops::Mul<&UFloat> for &UFloat {
    type Output = UFloat;

    fn mul(self, rhs: &UFloat) -> UFloat {
        UFloat {
            nominal: self.nominal * rhs.nominal,
            derivs: UFloat::combine(&self.derivs, rhs.nominal, &rhs.derivs, self.nominal),
        }
    }
}

impl std::ops::Div<&UFloat> for &UFloat {
    type Output = UFloat;

    fn div(self, rhs: &UFloat) -> UFloat {
        let b = rhs.nominal;
        UFloat {
            nominal: self.nominal / b,
            derivs: UFloat::combine(&self.derivs, 1.0 / b, &rhs.derivs, -self.nominal / (b * b)),
        }
    }
}

impl std::ops::Neg for &UFloat {
    type Output = UFloat;

    fn neg(self) -> UFloat {
        self.map(-self.nominal, -1.0)
    }
}

impl std::ops::Mul<f64> for &UFloat {
    type Output = UFloat;

    fn mul(self, rhs: f64) -> UFloat {
        self.map(self.nominal * rhs, rhs)
    }
}

/// Build correlated values from nominals and a covariance matrix.
///
/// Value `i` receives row `i` of the Cholesky factor as its sensitivity
/// vector over `values.len()` shared error sources.
pub fn correlated_values(values: &[f64], covariance: &DMatrix<f64>) -> Result<Vec<UFloat>, Error> {
    let n = values.len();
    if covariance.nrows() != n || covariance.ncols() != n {
        return Err(Error::CovarianceShape {
            expected: n,
            found: covariance.nrows(),
        });
    }
    let chol = nalgebra::Cholesky::new(covariance.clone())
        .ok_or_else(|| Error::Covariance("matrix is not positive definite".to_string()))?;
    let l = chol.l();

    Ok(values
        .iter()
        .enumerate()
        .map(|(i, &v)| UFloat {
            nominal: v,
            derivs: (0..n).map(|j| l[(i, j)]).collect(),
        })
        .collect())
}
