//src/verify.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RunError;
use crate::merge::sorted_sources;
use crate::types::{TaskOutcome, VariantKind};

/// High-confidence files that actually exist after dispatch, sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedOutputs {
    pub snp: Vec<PathBuf>,
    pub indel: Vec<PathBuf>,
    /// Outputs that exist but are zero bytes long.
    pub empty: Vec<PathBuf>,
}

impl CollectedOutputs {
    pub fn files(&self, kind: VariantKind) -> &[PathBuf] {
        match kind {
            VariantKind::Snp => &self.snp,
            VariantKind::Indel => &self.indel,
        }
    }
}

pub fn collect_outputs(outcomes: &[TaskOutcome]) -> CollectedOutputs {
    let mut snp = Vec::new();
    let mut indel = Vec::new();

    for result in outcomes.iter().filter_map(|o| o.as_ref().ok()) {
        for kind in VariantKind::ALL {
            let hc = result.high_confidence(kind);
            if hc.is_file() {
                match kind {
                    VariantKind::Snp => snp.push(hc),
                    VariantKind::Indel => indel.push(hc),
                }
            } else {
                log::warn!(
                    "Task {} ({}) finished without {}",
                    result.index,
                    result.input.display(),
                    hc.display()
                );
            }
        }
    }

    let snp = sorted_sources(snp);
    let indel = sorted_sources(indel);
    let empty = snp
        .iter()
        .chain(indel.iter())
        .filter(|p| file_len(p) == Some(0))
        .cloned()
        .collect();

    CollectedOutputs { snp, indel, empty }
}

/// The snp count, the indel count and the number of submitted pileups must all
/// agree. Zero-byte outputs are only reported.
pub fn verify_outputs(
    outputs: &CollectedOutputs,
    expected: usize,
    failed: usize,
) -> Result<(), RunError> {
    if outputs.snp.len() != expected || outputs.indel.len() != expected {
        return Err(RunError::OutputCountMismatch {
            expected,
            snp: outputs.snp.len(),
            indel: outputs.indel.len(),
            failed,
        });
    }
    for path in &outputs.empty {
        log::error!("Empty output detected: {}", path.display());
    }
    Ok(())
}

/// A merged file must hold something once at least one pileup was processed.
pub fn check_merged(path: &Path, task_count: usize) -> Result<(), RunError> {
    if task_count > 0 && file_len(path).unwrap_or(0) == 0 {
        return Err(RunError::EmptyMergedOutput(path.to_path_buf()));
    }
    Ok(())
}

fn file_len(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}
