//src/dispatch.rs

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use indicatif::ProgressBar;
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::JobConfig;
use crate::error::{DispatchError, PipelineError};
use crate::exec::CommandRunner;
use crate::pipeline::run_pipeline;
use crate::types::{Task, TaskFailure, TaskOutcome, TaskResult};

/// Fans tasks out over a fixed-size worker pool.
///
/// Every input becomes a task up front; tasks beyond the pool size wait in
/// FIFO order. `dispatch` returns only once each task has either produced a
/// result or been recorded as a failure.
pub struct Dispatcher {
    pool: ThreadPool,
    workers: usize,
    progress: ProgressBar,
}

impl Dispatcher {
    pub fn new(workers: usize) -> Result<Self, DispatchError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("varscan-worker-{i}"))
            .build()
            .map_err(|source| DispatchError::Pool { workers, source })?;
        Ok(Self {
            pool,
            workers,
            progress: ProgressBar::hidden(),
        })
    }

    /// Tick `progress` once per finished task.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `job` once per input. Outcomes come back in completion order.
    pub fn dispatch<F>(&self, inputs: &[PathBuf], config: Arc<JobConfig>, job: F) -> Vec<TaskOutcome>
    where
        F: Fn(&Task) -> Result<TaskResult, PipelineError> + Sync,
    {
        let outcomes = Mutex::new(Vec::with_capacity(inputs.len()));
        let job = &job;
        let outcomes_ref = &outcomes;
        let progress = &self.progress;

        log::info!(
            "Dispatching {} task(s) across {} worker(s)",
            inputs.len(),
            self.workers
        );

        self.pool.scope_fifo(|scope| {
            for (index, input) in inputs.iter().enumerate() {
                let task = Task {
                    input: input.clone(),
                    index,
                    config: Arc::clone(&config),
                };
                scope.spawn_fifo(move |_| {
                    let outcome = execute(job, task);
                    match &outcome {
                        Ok(result) => log::info!("{result}"),
                        Err(failure) => log::error!("{failure}"),
                    }
                    outcomes_ref.lock().push(outcome);
                    progress.inc(1);
                });
            }
        });

        outcomes.into_inner()
    }

    /// The usual job: the full VarScan pipeline for each pileup.
    pub fn dispatch_pipelines(
        &self,
        inputs: &[PathBuf],
        config: Arc<JobConfig>,
        runner: &dyn CommandRunner,
    ) -> Vec<TaskOutcome> {
        self.dispatch(inputs, config, |task| {
            run_pipeline(&task.input, task.index, &task.config, runner)
        })
    }
}

/// Run one task, turning both errors and panics into a `TaskFailure`.
fn execute<F>(job: &F, task: Task) -> TaskOutcome
where
    F: Fn(&Task) -> Result<TaskResult, PipelineError>,
{
    let failure = |reason: String| TaskFailure {
        index: task.index,
        input: task.input.clone(),
        reason,
    };
    match panic::catch_unwind(AssertUnwindSafe(|| job(&task))) {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => Err(failure(err.to_string())),
        Err(payload) => Err(failure(format!("panicked: {}", panic_message(&*payload)))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
