use serde::Serialize;

pub const DEFAULT_MAX_REF_MISSING: f64 = 0.3;
pub const DEFAULT_MIN_RETAINED: f64 = 0.7;

pub const DEFAULT_SIGMA_TOL: f64 = 1e-2;
pub const DEFAULT_SIGMA_MAX_ITER: usize = 10;
pub const DEFAULT_SIGMA2_MIN: f64 = 0.8;
pub const DEFAULT_SIGMA2_MAX: f64 = 5.0;

pub const DEFAULT_EIGEN_FLOOR: f64 = 0.2;
pub const DEFAULT_EIGEN_RELATIVE: f64 = 1e-6;

pub const DEFAULT_SOP_PASS: f64 = 0.7;

/// Locus-level guard applied after allele harmonization
#[derive(Debug, Clone, Serialize)]
pub struct HarmonizeParams {
    /// skip when the exposure ref-allele missing fraction exceeds this
    pub max_ref_missing: f64,
    /// skip when the retained fraction of rows falls below this
    pub min_retained: f64,
}

impl Default for HarmonizeParams {
    fn default() -> Self {
        Self {
            max_ref_missing: DEFAULT_MAX_REF_MISSING,
            min_retained: DEFAULT_MIN_RETAINED,
        }
    }
}

/// Iterative weighted-median estimation of the z-score scale σ²
#[derive(Debug, Clone, Serialize)]
pub struct SigmaParams {
    pub tol: f64,
    pub max_iter: usize,
    pub min_sigma2: f64,
    pub max_sigma2: f64,
}

impl Default for SigmaParams {
    fn default() -> Self {
        Self {
            tol: DEFAULT_SIGMA_TOL,
            max_iter: DEFAULT_SIGMA_MAX_ITER,
            min_sigma2: DEFAULT_SIGMA2_MIN,
            max_sigma2: DEFAULT_SIGMA2_MAX,
        }
    }
}

/// Eigenvalue cutoff of the truncated LD basis.
///
/// With `threshold = None` the cutoff is `max(floor, relative * λ_max)`.
#[derive(Debug, Clone, Serialize)]
pub struct SpectralParams {
    pub threshold: Option<f64>,
    pub floor: f64,
    pub relative: f64,
}

impl Default for SpectralParams {
    fn default() -> Self {
        Self {
            threshold: None,
            floor: DEFAULT_EIGEN_FLOOR,
            relative: DEFAULT_EIGEN_RELATIVE,
        }
    }
}

impl SpectralParams {
    pub fn cutoff(&self, lambda_max: f64) -> f64 {
        self.threshold
            .unwrap_or_else(|| self.floor.max(self.relative * lambda_max))
    }
}

/// Signal-overlap (SOP) scoring; a locus passes when `SOP >= pass_threshold`
#[derive(Debug, Clone, Serialize)]
pub struct SopParams {
    pub pass_threshold: f64,
    pub sigma: SigmaParams,
    pub spectral: SpectralParams,
}

impl Default for SopParams {
    fn default() -> Self {
        Self {
            pass_threshold: DEFAULT_SOP_PASS,
            sigma: SigmaParams::default(),
            spectral: SpectralParams::default(),
        }
    }
}

/// Everything a locus run needs
#[derive(Debug, Clone, Serialize, Default)]
pub struct LocusParams {
    pub harmonize: HarmonizeParams,
    pub sop: SopParams,
}
