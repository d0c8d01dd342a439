use std::path::Path;

use anyhow::{ensure, Context, Result};
use log::info;
use matrix_util::common_io::read_table;

use crate::ld::{read_ld, read_ld_blocks};
use crate::locus::{LocusInput, OverlapInput};
use crate::summary_stats::{read_id_list, read_paired_sumstats};

const NONE_FIELD: &str = "-";

/// One line of the batch manifest. Optional inputs are `-` in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub locus: Box<str>,
    pub pairs: String,
    pub ld: Option<String>,
    pub blocks: Option<String>,
    pub exposure_set: Option<String>,
    pub outcome_set: Option<String>,
    pub instruments: Option<String>,
}

fn resolve(base: Option<&Path>, field: &str) -> Option<String> {
    if field.is_empty() || field == NONE_FIELD {
        return None;
    }
    let path = Path::new(field);
    match base {
        Some(dir) if path.is_relative() => Some(dir.join(path).to_string_lossy().into_owned()),
        _ => Some(field.to_string()),
    }
}

/// Read the batch manifest with columns `locus pairs ld blocks
/// exposure_set outcome_set` and an optional `instruments` column.
/// Relative paths are taken from the manifest's directory.
pub fn read_manifest(path: &str) -> Result<Vec<ManifestEntry>> {
    let table = read_table(path, "\t", true)?;

    let locus_col = table.require_column("locus", path)?;
    let pairs_col = table.require_column("pairs", path)?;
    let ld_col = table.column_index("ld");
    let blocks_col = table.column_index("blocks");
    let exp_col = table.column_index("exposure_set");
    let out_col = table.column_index("outcome_set");
    let inst_col = table.column_index("instruments");

    let base = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty());

    let mut entries = Vec::with_capacity(table.num_rows());
    for (i, row) in table.rows.iter().enumerate() {
        let get = |col: Option<usize>| -> Option<String> {
            col.and_then(|j| row.get(j)).and_then(|x| resolve(base, x))
        };
        let locus = row
            .get(locus_col)
            .with_context(|| format!("{}: line {} has no locus", path, i + 2))?;
        let pairs = get(Some(pairs_col))
            .with_context(|| format!("{}: locus {} has no pairs file", path, locus))?;

        entries.push(ManifestEntry {
            locus: locus.clone(),
            pairs,
            ld: get(ld_col),
            blocks: get(blocks_col),
            exposure_set: get(exp_col),
            outcome_set: get(out_col),
            instruments: get(inst_col),
        });
    }

    info!("Read {} loci from {}", entries.len(), path);
    Ok(entries)
}

impl ManifestEntry {
    /// Read all files of this locus
    pub fn load(&self) -> Result<LocusInput> {
        load_locus(
            &self.locus,
            &self.pairs,
            self.ld.as_deref(),
            self.blocks.as_deref(),
            self.exposure_set.as_deref(),
            self.outcome_set.as_deref(),
            self.instruments.as_deref(),
        )
    }
}

/// Assemble a locus from its files. The overlap part needs the LD file
/// and both informative sets; blocks are optional.
#[allow(clippy::too_many_arguments)]
pub fn load_locus(
    name: &str,
    pairs: &str,
    ld: Option<&str>,
    blocks: Option<&str>,
    exposure_set: Option<&str>,
    outcome_set: Option<&str>,
    instruments: Option<&str>,
) -> Result<LocusInput> {
    let mut input = LocusInput::new(name, read_paired_sumstats(pairs)?);

    input.overlap = match (ld, exposure_set, outcome_set) {
        (Some(ld), Some(exp_set), Some(out_set)) => Some(OverlapInput {
            ld: read_ld(ld)?,
            blocks: match blocks {
                Some(b) => read_ld_blocks(b)?,
                None => vec![],
            },
            exposure_set: read_id_list(exp_set)?,
            outcome_set: read_id_list(out_set)?,
        }),
        (None, None, None) => None,
        _ => {
            anyhow::bail!(
                "{}: signal overlap needs the LD matrix and both informative sets",
                name
            )
        }
    };

    if let Some(file) = instruments {
        input.instrument_ids = Some(read_id_list(file)?);
    }

    ensure!(
        input.overlap.is_some() || blocks.is_none(),
        "{}: LD blocks given without an LD matrix",
        name
    );
    Ok(input)
}
