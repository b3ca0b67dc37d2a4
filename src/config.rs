//src/config.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Parameters shared by every task of a run.
///
/// Built once before dispatch and handed to the workers behind an `Arc`;
/// nothing writes to it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    // VarScan somatic
    pub min_coverage: u32,
    pub min_coverage_normal: u32,
    pub min_coverage_tumor: u32,
    pub min_var_freq: f64,
    pub min_freq_for_hom: f64,
    pub normal_purity: f64,
    pub tumor_purity: f64,
    pub vs_p_value: f64,
    pub somatic_p_value: f64,
    pub strand_filter: bool,
    pub output_vcf: bool,
    pub validation: bool,

    // VarScan processSomatic
    pub min_tumor_freq: f64,
    pub max_normal_freq: f64,
    pub vps_p_value: f64,

    // Tool locations
    pub java_bin: String,
    pub java_opts: String,
    pub varscan_jar: String,

    /// Limit on a single external call; `None` waits forever.
    pub timeout: Option<Duration>,
    pub thread_count: usize,
    /// Working directory of the VarScan child processes.
    pub work_dir: PathBuf,
    /// Where the merged files are written.
    pub output_dir: PathBuf,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            min_coverage: 8,
            min_coverage_normal: 8,
            min_coverage_tumor: 6,
            min_var_freq: 0.10,
            min_freq_for_hom: 0.75,
            normal_purity: 1.00,
            tumor_purity: 1.00,
            vs_p_value: 0.99,
            somatic_p_value: 0.05,
            strand_filter: false,
            output_vcf: true,
            validation: false,
            min_tumor_freq: 0.10,
            max_normal_freq: 0.05,
            vps_p_value: 0.07,
            java_bin: "java".to_string(),
            java_opts: "3G".to_string(),
            varscan_jar: "/opt/VarScan.v2.3.9.jar".to_string(),
            timeout: None,
            thread_count: 2,
            work_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
        }
    }
}

impl JobConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_count == 0 {
            return Err(invalid("thread_count", "must be at least 1"));
        }

        let unit_fields = [
            ("min_var_freq", self.min_var_freq),
            ("min_freq_for_hom", self.min_freq_for_hom),
            ("normal_purity", self.normal_purity),
            ("tumor_purity", self.tumor_purity),
            ("vs_p_value", self.vs_p_value),
            ("somatic_p_value", self.somatic_p_value),
            ("min_tumor_freq", self.min_tumor_freq),
            ("max_normal_freq", self.max_normal_freq),
            ("vps_p_value", self.vps_p_value),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("{value} is outside [0, 1]")));
            }
        }

        if self.java_opts.trim().is_empty() {
            return Err(invalid("java_opts", "empty heap size"));
        }
        if self.varscan_jar.trim().is_empty() {
            return Err(invalid("varscan_jar", "empty jar path"));
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(invalid("timeout", "must be greater than zero"));
        }
        Ok(())
    }

    /// Resolve a file VarScan writes relative to its working directory.
    pub fn work_path(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Base name VarScan uses as the output prefix for a pileup.
pub fn output_base(pileup: &Path) -> Result<String, ConfigError> {
    pileup
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ConfigError::NoBaseName(pileup.to_path_buf()))
}

/// Two pileups with the same base name would overwrite each other's outputs.
pub fn check_unique_bases(pileups: &[PathBuf]) -> Result<(), ConfigError> {
    let mut seen: HashMap<String, &PathBuf> = HashMap::with_capacity(pileups.len());
    for pileup in pileups {
        let base = output_base(pileup)?;
        if let Some(first) = seen.get(&base) {
            return Err(ConfigError::DuplicateBaseName {
                base,
                first: (*first).clone(),
                second: pileup.clone(),
            });
        }
        seen.insert(base, pileup);
    }
    Ok(())
}
