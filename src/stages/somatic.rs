//src/stages/somatic.rs

use std::path::Path;

use super::{run_stage, varscan_command};
use crate::config::JobConfig;
use crate::error::StageError;
use crate::exec::{CommandRunner, CommandSpec};

pub const STAGE: &str = "VarScan somatic";

/// `VarScan somatic`: tumor/normal mpileup in, `<base>.snp.vcf` and
/// `<base>.indel.vcf` out. Whether those files really appeared is checked by
/// the pipeline, not here.
pub struct SomaticCaller<'a> {
    config: &'a JobConfig,
    runner: &'a dyn CommandRunner,
}

impl<'a> SomaticCaller<'a> {
    pub fn new(config: &'a JobConfig, runner: &'a dyn CommandRunner) -> Self {
        Self { config, runner }
    }

    pub fn command(&self, pileup: &Path, output_base: &str) -> CommandSpec {
        let c = self.config;
        let spec = varscan_command(c)
            .arg("somatic")
            .arg(pileup.to_string_lossy())
            .arg(output_base)
            .args(["--mpileup", "1"])
            .args(["--min-coverage".to_string(), c.min_coverage.to_string()])
            .args(["--min-coverage-normal".to_string(), c.min_coverage_normal.to_string()])
            .args(["--min-coverage-tumor".to_string(), c.min_coverage_tumor.to_string()])
            .args(["--min-var-freq".to_string(), c.min_var_freq.to_string()])
            .args(["--min-freq-for-hom".to_string(), c.min_freq_for_hom.to_string()])
            .args(["--normal-purity".to_string(), c.normal_purity.to_string()])
            .args(["--tumor-purity".to_string(), c.tumor_purity.to_string()])
            .args(["--p-value".to_string(), c.vs_p_value.to_string()])
            .args(["--somatic-p-value".to_string(), c.somatic_p_value.to_string()])
            .args(["--strand-filter", flag(c.strand_filter)])
            .args(["--output-vcf", flag(c.output_vcf)]);

        if c.validation {
            spec.arg("--validation")
        } else {
            spec
        }
    }

    pub fn run(&self, pileup: &Path, output_base: &str) -> Result<(), StageError> {
        let spec = self.command(pileup, output_base);
        run_stage(self.runner, STAGE, &spec)
    }
}

fn flag(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}
