use clap::Args;
use lupin::params::*;

/// Thresholds shared by the analysis commands
#[derive(Args, Debug, Clone)]
pub struct ThresholdArgs {
    #[arg(
        long,
        default_value_t = DEFAULT_MAX_REF_MISSING,
        help = "Skip a locus when the exposure ref allele is missing in more than this fraction of rows"
    )]
    pub max_ref_missing: f64,

    #[arg(
        long,
        default_value_t = DEFAULT_MIN_RETAINED,
        help = "Skip a locus when fewer than this fraction of rows survive harmonization"
    )]
    pub min_retained: f64,

    #[arg(
        long,
        default_value_t = DEFAULT_SOP_PASS,
        help = "A locus passes when SOP >= this value"
    )]
    pub sop_threshold: f64,

    #[arg(
        long,
        help = "Eigenvalue cutoff of the LD basis (default: max(0.2, 1e-6 * largest eigenvalue))"
    )]
    pub eigen_threshold: Option<f64>,

    #[arg(long, default_value_t = DEFAULT_SIGMA_TOL, help = "Convergence tolerance of the sigma2 estimate")]
    pub sigma_tol: f64,

    #[arg(long, default_value_t = DEFAULT_SIGMA_MAX_ITER, help = "Iterations of the sigma2 estimate")]
    pub sigma_max_iter: usize,

    #[arg(long, default_value_t = DEFAULT_SIGMA2_MIN, help = "Lower clip of sigma2")]
    pub min_sigma2: f64,

    #[arg(long, default_value_t = DEFAULT_SIGMA2_MAX, help = "Upper clip of sigma2")]
    pub max_sigma2: f64,
}

impl ThresholdArgs {
    pub fn to_params(&self) -> anyhow::Result<LocusParams> {
        anyhow::ensure!(
            self.min_sigma2 > 0.0 && self.min_sigma2 <= self.max_sigma2,
            "need 0 < min-sigma2 <= max-sigma2"
        );
        Ok(LocusParams {
            harmonize: HarmonizeParams {
                max_ref_missing: self.max_ref_missing,
                min_retained: self.min_retained,
            },
            sop: SopParams {
                pass_threshold: self.sop_threshold,
                sigma: SigmaParams {
                    tol: self.sigma_tol,
                    max_iter: self.sigma_max_iter,
                    min_sigma2: self.min_sigma2,
                    max_sigma2: self.max_sigma2,
                },
                spectral: SpectralParams {
                    threshold: self.eigen_threshold,
                    ..Default::default()
                },
            },
        })
    }
}
