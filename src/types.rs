//src/types.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::JobConfig;

/// The two result categories VarScan writes per pileup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Snp,
    Indel,
}

impl VariantKind {
    pub const ALL: [VariantKind; 2] = [VariantKind::Snp, VariantKind::Indel];

    /// Infix VarScan uses in its output names, e.g. `base.snp.vcf`.
    pub fn infix(self) -> &'static str {
        match self {
            VariantKind::Snp => "snp",
            VariantKind::Indel => "indel",
        }
    }

    /// Candidate calls written by `somatic` for an output base.
    pub fn candidate_name(self, output_base: &str) -> String {
        format!("{}.{}.vcf", output_base, self.infix())
    }

    /// File name of the merged output for this category.
    pub fn merged_name(self) -> String {
        format!("multi_varscan2_{}_merged.vcf", self.infix())
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.infix())
    }
}

/// `processSomatic` on `x.vcf` leaves its high-confidence calls in `x.Somatic.hc.vcf`.
pub fn high_confidence_path(candidate: &Path) -> PathBuf {
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    candidate.with_file_name(format!("{stem}.Somatic.hc.vcf"))
}

/// One pileup to push through the pipeline.
#[derive(Debug, Clone)]
pub struct Task {
    pub input: PathBuf,
    pub index: usize,
    pub config: Arc<JobConfig>,
}

/// What a successful pipeline run hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub snp_file: PathBuf,
    pub indel_file: PathBuf,
    pub input: PathBuf,
    pub index: usize,
}

impl TaskResult {
    pub fn candidate(&self, kind: VariantKind) -> &Path {
        match kind {
            VariantKind::Snp => &self.snp_file,
            VariantKind::Indel => &self.indel_file,
        }
    }

    pub fn high_confidence(&self, kind: VariantKind) -> PathBuf {
        high_confidence_path(self.candidate(kind))
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task {} ({}) -> {}, {}",
            self.index,
            self.input.display(),
            self.snp_file.display(),
            self.indel_file.display()
        )
    }
}

/// A task that did not make it to the end of its pipeline.
#[derive(Debug, Clone, Error)]
#[error("task {index} ({}) failed: {reason}", input.display())]
pub struct TaskFailure {
    pub index: usize,
    pub input: PathBuf,
    pub reason: String,
}

pub type TaskOutcome = Result<TaskResult, TaskFailure>;
