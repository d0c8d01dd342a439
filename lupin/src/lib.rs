//! # lupin
//!
//! Locus-level Unified Pleiotropy and INstrument analysis.
//!
//! For each locus, exposure (QTL) and outcome (GWAS) summary statistics are
//! harmonized to a common allele coding, the LD-aware overlap of the two
//! association signals is scored (SOP), and two-sample Mendelian
//! Randomization estimates are computed (IVW, MR-Egger).

pub mod common;
pub mod error;
pub mod harmonize;
pub mod io;
pub mod ld;
pub mod locus;
pub mod mr;
pub mod params;
pub mod sop;
pub mod summary_stats;
