//src/pipeline.rs

use std::fs;
use std::path::Path;

use crate::config::{output_base, JobConfig};
use crate::error::PipelineError;
use crate::exec::CommandRunner;
use crate::stages::{somatic, SomaticCaller, SomaticFilter};
use crate::types::{TaskResult, VariantKind};

/// Somatic calling followed by the high-confidence filter on the snp and then
/// the indel calls, for a single pileup.
///
/// The first failing stage ends the task; nothing is retried.
pub fn run_pipeline(
    pileup: &Path,
    index: usize,
    config: &JobConfig,
    runner: &dyn CommandRunner,
) -> Result<TaskResult, PipelineError> {
    if !pileup.is_file() {
        return Err(PipelineError::MissingInput(pileup.to_path_buf()));
    }
    // VarScan runs inside the work directory, so hand it a path that still resolves there.
    let pileup_arg = fs::canonicalize(pileup)
        .map_err(|_| PipelineError::MissingInput(pileup.to_path_buf()))?;
    let base = output_base(pileup).map_err(|_| PipelineError::MissingInput(pileup.to_path_buf()))?;

    SomaticCaller::new(config, runner).run(&pileup_arg, &base)?;

    let snp_name = VariantKind::Snp.candidate_name(&base);
    let indel_name = VariantKind::Indel.candidate_name(&base);
    let snp_file = config.work_path(&snp_name);
    let indel_file = config.work_path(&indel_name);

    for path in [&snp_file, &indel_file] {
        if !path.is_file() {
            return Err(PipelineError::MissingOutput {
                stage: somatic::STAGE,
                path: path.clone(),
            });
        }
    }

    let filter = SomaticFilter::new(config, runner);
    filter.run(Path::new(&snp_name))?;
    filter.run(Path::new(&indel_name))?;

    Ok(TaskResult {
        snp_file,
        indel_file,
        input: pileup.to_path_buf(),
        index,
    })
}
