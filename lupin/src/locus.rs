use std::collections::HashSet;
use std::fmt;

use anyhow::Result;
use indicatif::ParallelProgressIterator;
use log::{info, warn};
use rayon::prelude::*;

use crate::error::{LocusError, SkipReason};
use crate::harmonize::{harmonize_locus, HarmonizedPair};
use crate::ld::{expand_block_ids, LdBlock, LdMatrix};
use crate::mr::{direction_by_group, run_mr, GroupDirection, Instruments, MrResult};
use crate::params::LocusParams;
use crate::sop::{score_overlap_by_ids, LocusUniverse, OverlapScore};
use crate::summary_stats::{resolve_duplicate_snps, PairedRecord};

/// LD structure and informative sets needed for the overlap score
#[derive(Debug, Clone)]
pub struct OverlapInput {
    pub ld: LdMatrix,
    pub blocks: Vec<LdBlock>,
    pub exposure_set: Vec<Box<str>>,
    pub outcome_set: Vec<Box<str>>,
}

/// Everything known about one locus before analysis
#[derive(Debug, Clone)]
pub struct LocusInput {
    pub name: Box<str>,
    pub records: Vec<PairedRecord>,
    pub overlap: Option<OverlapInput>,
    /// restrict MR to these SNPs; `block|` ids expand to their members
    pub instrument_ids: Option<Vec<Box<str>>>,
}

impl LocusInput {
    pub fn new(name: &str, records: Vec<PairedRecord>) -> Self {
        Self {
            name: name.into(),
            records,
            overlap: None,
            instrument_ids: None,
        }
    }
}

/// Results of a locus that passed the data-quality guard
#[derive(Debug, Clone)]
pub struct LocusAnalysis {
    pub harmonized: HarmonizedPair,
    pub overlap: Option<OverlapScore>,
    pub mr: MrResult,
    pub directions: Vec<GroupDirection>,
}

/// Harmonize, score the signal overlap when LD is given, and estimate
/// the causal effect.
pub fn run_locus(input: &LocusInput, params: &LocusParams) -> Result<LocusAnalysis, LocusError> {
    let records = resolve_duplicate_snps(input.records.clone());
    if records.len() < input.records.len() {
        info!(
            "{}: kept {} of {} rows after removing duplicate SNPs",
            input.name,
            records.len(),
            input.records.len()
        );
    }

    let harmonized = harmonize_locus(&records, &params.harmonize)?;

    let overlap = match input.overlap.as_ref() {
        Some(ov) => {
            let universe = LocusUniverse::build(&harmonized, &ov.ld, &ov.blocks)?;
            Some(score_overlap_by_ids(
                &universe,
                &ov.exposure_set,
                &ov.outcome_set,
                &params.sop,
            )?)
        }
        None => None,
    };

    let instruments = match input.instrument_ids.as_ref() {
        Some(ids) => {
            let blocks = input
                .overlap
                .as_ref()
                .map(|ov| ov.blocks.as_slice())
                .unwrap_or_default();
            let keep: HashSet<Box<str>> = expand_block_ids(ids, blocks)?.into_iter().collect();
            Instruments::from_records(harmonized.records().filter(|r| keep.contains(r.snp_id())))
        }
        None => Instruments::from_records(harmonized.records()),
    };

    if instruments.is_empty() {
        return Err(LocusError::Skip(SkipReason::NoInstruments));
    }

    let mr = run_mr(&instruments);
    let directions = direction_by_group(harmonized.records());

    Ok(LocusAnalysis {
        harmonized,
        overlap,
        mr,
        directions,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocusStatus {
    Success,
    Skip(SkipReason),
    Error(String),
}

impl fmt::Display for LocusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocusStatus::Success => write!(f, "success"),
            LocusStatus::Skip(reason) => write!(f, "skip ({})", reason),
            LocusStatus::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// Status row of a locus; `analysis` is set on success
#[derive(Debug, Clone)]
pub struct LocusOutcome {
    pub name: Box<str>,
    pub num_input: usize,
    pub status: LocusStatus,
    pub analysis: Option<LocusAnalysis>,
}

impl LocusOutcome {
    pub fn failed(name: &str, err: &anyhow::Error) -> Self {
        Self {
            name: name.into(),
            num_input: 0,
            status: LocusStatus::Error(format!("{:#}", err)),
            analysis: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == LocusStatus::Success
    }
}

/// [`run_locus`] with failures turned into a status
pub fn evaluate_locus(input: &LocusInput, params: &LocusParams) -> LocusOutcome {
    let (status, analysis) = match run_locus(input, params) {
        Ok(analysis) => (LocusStatus::Success, Some(analysis)),
        Err(LocusError::Skip(reason)) => {
            info!("{}: skip ({})", input.name, reason);
            (LocusStatus::Skip(reason), None)
        }
        Err(err) => {
            warn!("{}: {}", input.name, err);
            (LocusStatus::Error(err.to_string()), None)
        }
    };
    LocusOutcome {
        name: input.name.clone(),
        num_input: input.records.len(),
        status,
        analysis,
    }
}

/// Map `eval` over `tasks` on `jobs` threads (0 = all CPUs), results in
/// task order
pub fn run_batch<T, F>(tasks: &[T], jobs: usize, eval: F) -> Result<Vec<LocusOutcome>>
where
    T: Sync,
    F: Fn(&T) -> LocusOutcome + Sync + Send,
{
    let num_jobs = if jobs == 0 { num_cpus::get() } else { jobs };

    let mut results: Vec<(usize, LocusOutcome)> = if num_jobs <= 1 {
        tasks.iter().enumerate().map(|(i, t)| (i, eval(t))).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_jobs)
            .build()?;
        pool.install(|| {
            tasks
                .par_iter()
                .enumerate()
                .progress_count(tasks.len() as u64)
                .map(|(i, t)| (i, eval(t)))
                .collect()
        })
    };
    results.sort_by_key(|(i, _)| *i);

    let outcomes: Vec<LocusOutcome> = results.into_iter().map(|(_, x)| x).collect();
    let num_success = outcomes.iter().filter(|x| x.is_success()).count();
    info!(
        "Processed {} loci ({} success, {} skipped or failed) with {} jobs",
        outcomes.len(),
        num_success,
        outcomes.len() - num_success,
        num_jobs
    );
    Ok(outcomes)
}

/// Evaluate independent loci in parallel; one failing locus never stops
/// the others
pub fn run_loci(inputs: &[LocusInput], params: &LocusParams, jobs: usize) -> Result<Vec<LocusOutcome>> {
    run_batch(inputs, jobs, |input| evaluate_locus(input, params))
}
