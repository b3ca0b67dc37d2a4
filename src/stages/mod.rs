pub mod process_somatic;
pub mod somatic;

pub use process_somatic::SomaticFilter;
pub use somatic::SomaticCaller;

use crate::config::JobConfig;
use crate::error::StageError;
use crate::exec::{CommandRunner, CommandSpec};

/// `java -XX:+UseSerialGC -Xmx<heap> -jar <VarScan.jar>`, run inside the work directory.
fn varscan_command(config: &JobConfig) -> CommandSpec {
    CommandSpec::new(config.java_bin.as_str())
        .arg("-XX:+UseSerialGC")
        .arg(format!("-Xmx{}", config.java_opts))
        .arg("-jar")
        .arg(config.varscan_jar.as_str())
        .current_dir(&config.work_dir)
        .timeout(config.timeout)
}

/// Run `spec` and turn anything but a clean zero exit into a `StageError`.
fn run_stage(
    runner: &dyn CommandRunner,
    stage: &'static str,
    spec: &CommandSpec,
) -> Result<(), StageError> {
    let output = runner
        .run(spec)
        .map_err(|source| StageError::Exec { stage, source })?;

    if output.timed_out {
        return Err(StageError::TimedOut {
            stage,
            command: spec.to_string(),
            timeout: spec.timeout.unwrap_or_default(),
        });
    }
    if !output.success() {
        if !output.stderr.is_empty() {
            log::error!("{stage} stderr:\n{}", output.stderr.trim_end());
        }
        return Err(StageError::Failed {
            stage,
            command: spec.to_string(),
            exit_code: output.exit_code,
        });
    }
    Ok(())
}
