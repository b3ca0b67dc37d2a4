// src/lib.rs
pub mod config;
pub mod dispatch;
pub mod error;
pub mod exec;
pub mod merge;
pub mod pipeline;
pub mod progress;
pub mod stages;
pub mod types;
pub mod verify;

#[cfg(test)]
mod testing;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{check_unique_bases, JobConfig};
use crate::dispatch::Dispatcher;
use crate::error::{MergeError, RunError};
use crate::exec::CommandRunner;
use crate::merge::merge_outputs;
use crate::progress::RunProgress;
use crate::types::{TaskOutcome, VariantKind};
use crate::verify::{check_merged, collect_outputs, verify_outputs};

pub use crate::exec::SubprocessRunner;

/// Everything a finished run reports back.
#[derive(Debug)]
pub struct RunSummary {
    /// One entry per submitted pileup, in completion order.
    pub outcomes: Vec<TaskOutcome>,
    pub succeeded: usize,
    pub failed: usize,
    pub snp_merged: PathBuf,
    pub indel_merged: PathBuf,
    /// High-confidence files that were merged but had zero bytes.
    pub empty_outputs: Vec<PathBuf>,
}

impl RunSummary {
    pub fn merged(&self, kind: VariantKind) -> &PathBuf {
        match kind {
            VariantKind::Snp => &self.snp_merged,
            VariantKind::Indel => &self.indel_merged,
        }
    }
}

/// Call, filter and merge somatic variants for every pileup.
pub fn run(
    pileups: &[PathBuf],
    config: JobConfig,
    runner: &dyn CommandRunner,
) -> Result<RunSummary, RunError> {
    run_with_progress(pileups, config, runner, &RunProgress::hidden())
}

/// Same as [`run`], reporting finished pileups and the check/merge phases to `progress`.
pub fn run_with_progress(
    pileups: &[PathBuf],
    config: JobConfig,
    runner: &dyn CommandRunner,
    progress: &RunProgress,
) -> Result<RunSummary, RunError> {
    // 1. Freeze the configuration
    config.validate()?;
    check_unique_bases(pileups)?;
    let config = Arc::new(config);

    // 2. Run every pileup through the pipeline
    progress.tasks().set_length(pileups.len() as u64);
    let dispatcher = Dispatcher::new(config.thread_count)?.with_progress(progress.tasks().clone());
    let outcomes = dispatcher.dispatch_pipelines(pileups, Arc::clone(&config), runner);

    let failed = outcomes.iter().filter(|o| o.is_err()).count();
    let succeeded = outcomes.len() - failed;
    log::info!("{succeeded} task(s) succeeded, {failed} failed");

    // 3. Check outputs
    let outputs = progress.phase(
        "Checking outputs...",
        || {
            let outputs = collect_outputs(&outcomes);
            verify_outputs(&outputs, pileups.len(), failed)?;
            Ok::<_, RunError>(outputs)
        },
        |o| format!("Found {} snp and {} indel output(s)", o.snp.len(), o.indel.len()),
    )?;

    // 4. Merge
    let (snp_merged, indel_merged) = progress.phase(
        "Merging outputs...",
        || {
            fs::create_dir_all(&config.output_dir).map_err(|source| MergeError::Write {
                path: config.output_dir.clone(),
                source,
            })?;
            let snp_merged = config.output_dir.join(VariantKind::Snp.merged_name());
            let indel_merged = config.output_dir.join(VariantKind::Indel.merged_name());
            merge_outputs(outputs.files(VariantKind::Snp), &snp_merged)?;
            merge_outputs(outputs.files(VariantKind::Indel), &indel_merged)?;

            check_merged(&snp_merged, pileups.len())?;
            check_merged(&indel_merged, pileups.len())?;
            Ok::<_, RunError>((snp_merged, indel_merged))
        },
        |_| {
            format!(
                "Merged {} snp and {} indel file(s)",
                outputs.snp.len(),
                outputs.indel.len()
            )
        },
    )?;

    Ok(RunSummary {
        outcomes,
        succeeded,
        failed,
        snp_merged,
        indel_merged,
        empty_outputs: outputs.empty,
    })
}
