//src/stages/process_somatic.rs

use std::path::Path;

use super::{run_stage, varscan_command};
use crate::config::JobConfig;
use crate::error::StageError;
use crate::exec::{CommandRunner, CommandSpec};

pub const STAGE: &str = "VarScan processSomatic";

/// `VarScan processSomatic`: splits a candidate VCF and keeps the
/// high-confidence somatic calls in `<stem>.Somatic.hc.vcf`.
///
/// One value is built per task and reused for the snp and indel calls. It
/// holds no resources, so there is nothing to release afterwards.
pub struct SomaticFilter<'a> {
    config: &'a JobConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> SomaticFilter<'a> {
    pub fn new(config: &'a JobConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    pub fn command(&self, input_vcf: &Path) -> CommandSpec {
        let c = self.config;
        varscan_command(c)
            .arg("processSomatic")
            .arg(input_vcf.to_string_lossy())
            .args(["--min-tumor-freq".to_string(), c.min_tumor_freq.to_string()])
            .args(["--max-normal-freq".to_string(), c.max_normal_freq.to_string()])
            .args(["--p-value".to_string(), c.vps_p_value.to_string()])
    }

    pub fn run(&self, input_vcf: &Path) -> Result<(), StageError> {
        let spec = self.command(input_vcf);
        run_stage(self.runner, STAGE, &spec)
    }
}
