use log::debug;
use nalgebra::{Matrix2, Vector2};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::instruments::Instruments;

/// relative determinant below which `X'WX` counts as singular
const SINGULAR_RTOL: f64 = 1e-12;
/// weighted residual sum of squares below this share of `Σ w y²` is an exact fit
const EXACT_FIT_RTOL: f64 = 1e-12;
/// coefficient contributions below this share of `max |y|` vanish in an exact fit
const NEGLIGIBLE_RTOL: f64 = 1e-9;

/// Weighted regression of outcome on exposure effects with a free
/// intercept (directional pleiotropy)
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EggerResult {
    pub slope: f64,
    pub slope_se: f64,
    pub slope_pvalue: f64,
    pub intercept: f64,
    pub intercept_se: f64,
    pub intercept_pvalue: f64,
}

impl EggerResult {
    pub fn undefined() -> Self {
        Self {
            slope: f64::NAN,
            slope_se: f64::NAN,
            slope_pvalue: f64::NAN,
            intercept: f64::NAN,
            intercept_se: f64::NAN,
            intercept_pvalue: f64::NAN,
        }
    }
}

fn t_two_sided(t: f64, df: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) if !t.is_nan() => 2.0 * (1.0 - dist.cdf(t.abs())),
        _ => f64::NAN,
    }
}

/// MR-Egger: WLS of `beta_out` on `[1, beta_exp]` with `w = 1/se_out²`.
///
/// Standard errors come from `σ̂² (X'WX)⁻¹` with `σ̂² = Σ w r² / (n-2)`,
/// p-values from t(n-2). Needs at least three instruments; a singular
/// design gives NaN instead of an error.
pub fn mr_egger(instruments: &Instruments) -> EggerResult {
    let n = instruments.len();
    if n < 3 {
        return EggerResult::undefined();
    }

    let w = instruments.weights();
    let (x, y) = (&instruments.beta_exp, &instruments.beta_out);

    let mut xtwx = Matrix2::<f64>::zeros();
    let mut xtwy = Vector2::<f64>::zeros();
    let mut wyy = 0.0;
    for i in 0..n {
        let xi = Vector2::new(1.0, x[i]);
        xtwx += w[i] * xi * xi.transpose();
        xtwy += w[i] * y[i] * xi;
        wyy += w[i] * y[i] * y[i];
    }

    let scale = xtwx[(0, 0)] * xtwx[(1, 1)];
    let det = xtwx.determinant();
    if !(scale.is_finite() && det.is_finite()) || det.abs() <= SINGULAR_RTOL * scale.abs() {
        debug!("singular Egger design (det = {:.3e})", det);
        return EggerResult::undefined();
    }
    let Some(inv) = xtwx.try_inverse() else {
        return EggerResult::undefined();
    };

    let coef = inv * xtwy;
    let (intercept, slope) = (coef[0], coef[1]);

    let rss: f64 = (0..n)
        .map(|i| w[i] * (y[i] - intercept - slope * x[i]).powi(2))
        .sum();
    let df = (n - 2) as f64;
    let sigma2 = rss / df;

    let intercept_se = (sigma2 * inv[(0, 0)]).sqrt();
    let slope_se = (sigma2 * inv[(1, 1)]).sqrt();

    let (intercept_pvalue, slope_pvalue) = if rss <= EXACT_FIT_RTOL * wyy {
        // residuals vanish: a coefficient is either exactly zero or certain
        let max_y = y.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        let max_x = x.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        let negligible = |contribution: f64| contribution <= NEGLIGIBLE_RTOL * max_y;
        (
            if negligible(intercept.abs()) { 1.0 } else { 0.0 },
            if negligible(slope.abs() * max_x) { 1.0 } else { 0.0 },
        )
    } else {
        (
            t_two_sided(intercept / intercept_se, df),
            t_two_sided(slope / slope_se, df),
        )
    };

    EggerResult {
        slope,
        slope_se,
        slope_pvalue,
        intercept,
        intercept_se,
        intercept_pvalue,
    }
}
