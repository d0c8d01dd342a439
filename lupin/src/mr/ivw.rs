use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use super::instruments::Instruments;

/// Fixed-effect inverse-variance weighted estimate with Cochran's Q
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IvwResult {
    pub beta: f64,
    pub se: f64,
    pub pvalue: f64,
    pub q: f64,
    pub q_pvalue: f64,
}

impl IvwResult {
    pub fn undefined() -> Self {
        Self {
            beta: f64::NAN,
            se: f64::NAN,
            pvalue: f64::NAN,
            q: f64::NAN,
            q_pvalue: f64::NAN,
        }
    }
}

/// Two-sided standard normal p-value
pub(crate) fn normal_two_sided(z: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(norm) if z.is_finite() => 2.0 * (1.0 - norm.cdf(z.abs())),
        _ => f64::NAN,
    }
}

/// Upper tail of χ²(df)
fn chisq_upper(x: f64, df: f64) -> f64 {
    if !(x >= 0.0) {
        return f64::NAN;
    }
    match ChiSquared::new(df) {
        Ok(chisq) => 1.0 - chisq.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// `β = Σ w βo βe / Σ w βe²` with `w = 1/se_out²`.
///
/// Undefined (all NaN) with fewer than two instruments or a non-positive
/// denominator.
pub fn mr_ivw(instruments: &Instruments) -> IvwResult {
    let n = instruments.len();
    if n < 2 {
        return IvwResult::undefined();
    }

    let w = instruments.weights();
    let (be, bo) = (&instruments.beta_exp, &instruments.beta_out);

    let num: f64 = (0..n).map(|i| w[i] * bo[i] * be[i]).sum();
    let denom: f64 = (0..n).map(|i| w[i] * be[i] * be[i]).sum();
    if !(denom > 0.0) {
        return IvwResult::undefined();
    }

    let beta = num / denom;
    let q: f64 = (0..n).map(|i| w[i] * (bo[i] - beta * be[i]).powi(2)).sum();
    let se = (1.0 / denom).sqrt();

    IvwResult {
        beta,
        se,
        pvalue: normal_two_sided(beta / se),
        q,
        q_pvalue: chisq_upper(q, (n - 1) as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_single_instrument_is_undefined() {
        let inst = Instruments::from_slices(&[0.5], &[0.1], &[0.2], &[0.05]).unwrap();
        let res = mr_ivw(&inst);
        assert!(res.beta.is_nan() && res.pvalue.is_nan() && res.q_pvalue.is_nan());
    }

    #[test]
    fn test_two_instruments() {
        let inst =
            Instruments::from_slices(&[0.5, 0.3], &[0.1, 0.1], &[0.2, 0.15], &[0.05, 0.04]).unwrap();
        let res = mr_ivw(&inst);
        assert_abs_diff_eq!(res.beta, 68.125 / 156.25, epsilon = 1e-12);
        assert_abs_diff_eq!(res.se, 0.08, epsilon = 1e-12);

        let q = 400.0 * (0.2 - res.beta * 0.5f64).powi(2) + 625.0 * (0.15 - res.beta * 0.3f64).powi(2);
        assert_abs_diff_eq!(res.q, q, epsilon = 1e-10);
        assert!(res.pvalue > 0.0 && res.pvalue < 1e-6);
        assert!(res.q_pvalue > 0.0 && res.q_pvalue <= 1.0);
    }

    #[test]
    fn test_zero_exposure_effects() {
        let inst = Instruments::from_slices(&[0.0, 0.0], &[0.1, 0.1], &[0.2, 0.1], &[0.05, 0.05]).unwrap();
        assert!(mr_ivw(&inst).beta.is_nan());
    }
}
