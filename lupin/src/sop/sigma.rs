use log::debug;
use matrix_util::dmatrix_util::median;

use crate::params::SigmaParams;

/// Median of a χ²(1) variable
const CHISQ1_MEDIAN: f64 = 0.454936448;
const CHISQ1_MEDIAN_UPDATE: f64 = 0.45493644;
const WEIGHT_EPS: f64 = 1e-8;

/// Robust scale σ² of a z-score vector.
///
/// Start from `median(z²) / 0.4549` and repeatedly down-weight large
/// z-scores with `w = exp(-z² / 2σ²)`, setting σ² to the weighted median
/// of `z²` over the χ²(1) median. Each update is clipped to
/// `[min_sigma2, max_sigma2]`. Non-finite entries are ignored; an empty
/// vector gives 1.
pub fn estimate_sigma2(z: &[f64], params: &SigmaParams) -> f64 {
    let z2: Vec<f64> = z
        .iter()
        .filter(|x| x.is_finite())
        .map(|x| x * x)
        .collect();

    let Some(med) = median(&z2) else {
        return 1.0;
    };

    let mut sigma2 = med / CHISQ1_MEDIAN;

    let mut sorted = z2;
    sorted.sort_by(f64::total_cmp);

    for iter in 0..params.max_iter {
        let weights: Vec<f64> = sorted
            .iter()
            .map(|x| (-x / (2.0 * sigma2 + WEIGHT_EPS)).exp())
            .collect();

        let wmed = weighted_median_sorted(&sorted, &weights);
        let next = (wmed / CHISQ1_MEDIAN_UPDATE).clamp(params.min_sigma2, params.max_sigma2);
        let delta = (next - sigma2).abs();
        sigma2 = next;

        if delta < params.tol {
            debug!("sigma2 {:.4} converged after {} iterations", sigma2, iter + 1);
            break;
        }
    }

    sigma2
}

/// Weighted median of ascending `values`: the last value whose cumulative
/// weight does not exceed half of the total (the first value if none).
///
/// When the smallest value alone carries more than half the weight the
/// index is clamped to 0 on purpose. A negative index read from the end
/// would return the largest value instead.
fn weighted_median_sorted(values: &[f64], weights: &[f64]) -> f64 {
    debug_assert_eq!(values.len(), weights.len());
    let total: f64 = weights.iter().sum();
    let target = 0.5 * total;

    let mut cum = 0.0;
    let mut count: usize = 0;
    for &w in weights {
        cum += w;
        if cum <= target {
            count += 1;
        } else {
            break;
        }
    }
    values[count.saturating_sub(1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_empty_is_one() {
        assert_eq!(estimate_sigma2(&[], &SigmaParams::default()), 1.0);
        assert_eq!(estimate_sigma2(&[f64::NAN], &SigmaParams::default()), 1.0);
    }

    #[test]
    fn test_clipped_range() {
        let params = SigmaParams::default();
        let tiny = vec![0.01; 20];
        assert_abs_diff_eq!(estimate_sigma2(&tiny, &params), 0.8);

        let huge: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        let s = estimate_sigma2(&huge, &params);
        assert!((0.8..=5.0).contains(&s));
    }

    #[test]
    fn test_weighted_median() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(weighted_median_sorted(&values, &[1.0, 1.0, 1.0, 1.0]), 2.0);
        assert_eq!(weighted_median_sorted(&values, &[5.0, 1.0, 1.0, 1.0]), 1.0);
        assert_eq!(weighted_median_sorted(&values, &[0.0, 0.0, 0.0, 0.0]), 4.0);
    }

    #[test]
    fn test_heavy_smallest_weight_takes_smallest_value() {
        let z = [0.1, 10.0, 10.0, 10.0];
        assert_abs_diff_eq!(estimate_sigma2(&z, &SigmaParams::default()), 0.8);
    }

    #[test]
    fn test_hand_traced_iteration() {
        // z² = [1, 2.25, 4, 6.25, 9]; σ²₀ = 4 / 0.4549 ≈ 8.79.
        // step 1 picks z² = 2.25 (σ² ≈ 4.95), step 2 picks z² = 1
        // (σ² ≈ 2.20) and step 3 repeats it.
        let z = [1.0, 1.5, 2.0, 2.5, 3.0];
        let s = estimate_sigma2(&z, &SigmaParams::default());
        assert_abs_diff_eq!(s, 1.0 / CHISQ1_MEDIAN_UPDATE, epsilon = 1e-12);
        assert!(s > 0.8 && s < 5.0);
    }

    #[test]
    fn test_max_iter_stops_early() {
        let z = [1.0, 1.5, 2.0, 2.5, 3.0];
        let one_step = SigmaParams {
            max_iter: 1,
            ..Default::default()
        };
        assert_abs_diff_eq!(
            estimate_sigma2(&z, &one_step),
            2.25 / CHISQ1_MEDIAN_UPDATE,
            epsilon = 1e-12
        );

        let no_step = SigmaParams {
            max_iter: 0,
            ..Default::default()
        };
        assert_abs_diff_eq!(
            estimate_sigma2(&z, &no_step),
            4.0 / CHISQ1_MEDIAN,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_standard_normal_scale() {
        use rand::SeedableRng;
        use rand_distr::{Distribution, StandardNormal};

        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let z: Vec<f64> = (0..2000).map(|_| StandardNormal.sample(&mut rng)).collect();
        let s = estimate_sigma2(&z, &SigmaParams::default());
        assert!((0.8..=1.3).contains(&s), "sigma2 = {}", s);
    }
}
