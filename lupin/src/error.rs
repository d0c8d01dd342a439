use std::fmt;
use thiserror::Error;

/// Why a locus was left out of the analysis. Not fatal; the locus gets a
/// status row and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Empty,
    MissingRefAllele { fraction: f64, max_fraction: f64 },
    LowRetention { ratio: f64, min_ratio: f64 },
    NoInstruments,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "empty"),
            SkipReason::MissingRefAllele {
                fraction,
                max_fraction,
            } => write!(
                f,
                "exposure ref allele missing {:.1}% > {:.0}%",
                100.0 * fraction,
                100.0 * max_fraction
            ),
            SkipReason::LowRetention { ratio, min_ratio } => write!(
                f,
                "retained {:.1}% < {:.0}%",
                100.0 * ratio,
                100.0 * min_ratio
            ),
            SkipReason::NoInstruments => write!(f, "no valid instruments after harmonization"),
        }
    }
}

/// Per-locus failures of the analysis engine
#[derive(Debug, Error)]
pub enum LocusError {
    #[error("skip ({0})")]
    Skip(SkipReason),

    #[error("{context}: {} id(s) not found: {}", .ids.len(), join_ids(.ids))]
    MissingIds {
        context: Box<str>,
        ids: Vec<Box<str>>,
    },

    #[error("index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("{study} total signal energy is {energy}; overlap is undefined")]
    DegenerateEnergy { study: Box<str>, energy: f64 },

    #[error("numerical failure: {0}")]
    Numerical(String),
}

impl LocusError {
    pub fn is_skip(&self) -> bool {
        matches!(self, LocusError::Skip(_))
    }
}

fn join_ids(ids: &[Box<str>]) -> String {
    const MAX_SHOW: usize = 10;
    let mut shown: Vec<&str> = ids.iter().take(MAX_SHOW).map(|x| x.as_ref()).collect();
    if ids.len() > MAX_SHOW {
        shown.push("...");
    }
    shown.join(",")
}
