//src/error.rs

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The child process could not be driven at all.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed while waiting on `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// A VarScan invocation that did not finish cleanly.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("{stage} command failed with exit code {}: {command}", fmt_code(*exit_code))]
    Failed {
        stage: &'static str,
        command: String,
        exit_code: Option<i32>,
    },
    #[error("{stage} command timed out after {}s: {command}", timeout.as_secs_f64())]
    TimedOut {
        stage: &'static str,
        command: String,
        timeout: Duration,
    },
    #[error("{stage} command could not run: {source}")]
    Exec {
        stage: &'static str,
        #[source]
        source: ExecError,
    },
}

fn fmt_code(code: Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "<signal>".to_string())
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input pileup not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("{stage} did not produce {}", path.display())]
    MissingOutput { stage: &'static str, path: PathBuf },
    #[error(transparent)]
    Stage(#[from] StageError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("pileups {} and {} share the output base name `{base}`", first.display(), second.display())]
    DuplicateBaseName {
        base: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("pileup path has no file name: {}", .0.display())]
    NoBaseName(PathBuf),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("could not build a pool of {workers} workers: {source}")]
    Pool {
        workers: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("cannot open merge source {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot read merge source {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot write merged output {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Run-level failures. Any of these should end the process with a non-zero status.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(
        "missing output: expected {expected} snp and indel files, found {snp} snp and {indel} indel ({failed} task(s) failed)"
    )]
    OutputCountMismatch {
        expected: usize,
        snp: usize,
        indel: usize,
        failed: usize,
    },
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error("merged output is empty: {}", .0.display())]
    EmptyMergedOutput(PathBuf),
}
