//src/progress.rs

use std::sync::Arc;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Terminal progress for a run: one bar counting finished pileups plus a
/// spinner per post-dispatch phase.
#[derive(Clone)]
pub struct RunProgress {
    multi: MultiProgress,
    tasks: ProgressBar,
    finished: Arc<Mutex<Vec<String>>>,
}

impl RunProgress {
    /// Draws nothing; phases are still tracked.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    pub fn stderr() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(target);
        let tasks = multi.add(ProgressBar::new(0));
        tasks.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .expect("Invalid progress template")
            .progress_chars("=> "),
        );
        tasks.set_message("pileups");
        Self {
            multi,
            tasks,
            finished: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn tasks(&self) -> &ProgressBar {
        &self.tasks
    }

    /// Run `work` under a spinner showing `message`. On success the spinner
    /// finishes with `done(&value)`; on error it is abandoned.
    pub fn phase<T, E>(
        &self,
        message: &'static str,
        work: impl FnOnce() -> Result<T, E>,
        done: impl FnOnce(&T) -> String,
    ) -> Result<T, E> {
        let spinner = self.multi.add(ProgressBar::new_spinner());
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(TICKS)
                .template("{spinner:.yellow} {msg}")
                .expect("Invalid spinner template"),
        );
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));

        match work() {
            Ok(value) => {
                let summary = done(&value);
                spinner.finish_with_message(summary.clone());
                self.finished.lock().push(summary);
                Ok(value)
            }
            Err(err) => {
                spinner.abandon_with_message(format!("{message} failed"));
                Err(err)
            }
        }
    }

    /// Closing messages of the phases that succeeded, in order.
    pub fn finished_phases(&self) -> Vec<String> {
        self.finished.lock().clone()
    }
}
