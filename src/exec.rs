//src/exec.rs

use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::ExecError;

/// A fully built external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit status plus whatever the child printed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the child was ended by a signal (including our own kill on timeout).
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Runs one external command to completion.
///
/// Implementations do not retry; the caller decides what a failed exit means.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError>;
}

/// Runs commands as real child processes with piped stdout/stderr.
///
/// On Unix the child leads its own process group, so a timeout takes down
/// wrapper scripts together with the JVM they started.
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    poll_interval: Duration,
    drain_grace: Duration,
}

impl Default for SubprocessRunner {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            drain_grace: Duration::from_secs(2),
        }
    }
}

impl SubprocessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// How often a timed call checks whether the child has exited.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// How long to keep reading a pipe once the child is gone. A descendant
    /// that escaped the kill can hold the pipe open indefinitely.
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Returns `None` if the deadline passed; the child's process group is
    /// killed and the child reaped in that case.
    fn wait_with_deadline(
        &self,
        child: &mut Child,
        timeout: Duration,
    ) -> std::io::Result<Option<ExitStatus>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(Some(status));
            }
            let now = Instant::now();
            if now >= deadline {
                kill_tree(child);
                child.wait()?;
                return Ok(None);
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }
}

impl CommandRunner for SubprocessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        log::info!("Running command: {spec}");

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|source| ExecError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
        let stdout_reader = drain(child.stdout.take());
        let stderr_reader = drain(child.stderr.take());

        let waited = match spec.timeout {
            Some(timeout) => self.wait_with_deadline(&mut child, timeout),
            None => child.wait().map(Some),
        };
        let status = waited.map_err(|source| ExecError::Wait {
            program: spec.program.clone(),
            source,
        })?;

        let output = CommandOutput {
            exit_code: status.and_then(|s| s.code()),
            stdout: collect(stdout_reader, self.drain_grace, &spec.program),
            stderr: collect(stderr_reader, self.drain_grace, &spec.program),
            timed_out: status.is_none(),
        };

        if output.timed_out {
            log::warn!("Command timed out and was killed: {spec}");
        }
        if !output.stdout.is_empty() {
            log::debug!("[{}] stdout:\n{}", spec.program, output.stdout.trim_end());
        }
        if !output.stderr.is_empty() {
            log::debug!("[{}] stderr:\n{}", spec.program, output.stderr.trim_end());
        }
        Ok(output)
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    // The child is not reaped yet, so its pid still names its process group.
    let pgid = child.id() as libc::pid_t;
    // SAFETY: killpg only sends a signal; no memory is shared with the callee.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    // fails if the child exited in between; the caller reaps it either way
    let _ = child.kill();
}

/// Forward everything read from `pipe` in chunks, so output read before a
/// hang is never lost.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        rx
    })
}

/// Gather a pipe's output, giving up `grace` after the child is gone.
fn collect(reader: Option<Receiver<Vec<u8>>>, grace: Duration, program: &str) -> String {
    let Some(rx) = reader else {
        return String::new();
    };
    let deadline = Instant::now() + grace;
    let mut buf = Vec::new();
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(left) {
            Ok(chunk) => buf.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("[{program}] output pipe still open after exit; a descendant is holding it");
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }

    #[test]
    fn test_captures_exit_code_and_streams() {
        let out = SubprocessRunner::new()
            .run(&sh("echo out; echo err >&2; exit 3"))
            .expect("sh should start");
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
        assert!(!out.timed_out);
        assert!(!out.success());
    }

    #[test]
    fn test_success() {
        let out = SubprocessRunner::new().run(&sh("true")).unwrap();
        assert!(out.success());
    }

    #[test]
    fn test_timeout_kills_and_keeps_partial_output() {
        let spec = sh("echo partial; exec sleep 5").timeout(Some(Duration::from_millis(200)));
        let started = Instant::now();
        let out = SubprocessRunner::new()
            .with_poll_interval(Duration::from_millis(10))
            .run(&spec)
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(out.timed_out);
        assert!(!out.success());
        assert_eq!(out.stdout, "partial\n");
    }

    #[test]
    fn test_timeout_kills_descendants_of_a_wrapper() {
        // no exec: sh stays the parent and sleep inherits the output pipe
        let spec = sh("echo partial; sleep 5; echo done").timeout(Some(Duration::from_millis(200)));
        let started = Instant::now();
        let out = SubprocessRunner::new()
            .with_poll_interval(Duration::from_millis(10))
            .run(&spec)
            .unwrap();
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "call took {:?}",
            started.elapsed()
        );
        assert!(out.timed_out);
        assert_eq!(out.stdout, "partial\n");
    }

    #[test]
    fn test_escaped_descendant_cannot_hang_the_call() {
        // the background sleep outlives sh and keeps stdout open after a clean exit
        let spec = sh("echo early; (trap '' HUP; sleep 5) & exit 0");
        let started = Instant::now();
        let out = SubprocessRunner::new()
            .with_drain_grace(Duration::from_millis(300))
            .run(&spec)
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(out.success());
        assert_eq!(out.stdout, "early\n");
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let err = SubprocessRunner::new()
            .run(&CommandSpec::new("definitely-not-a-real-binary-7f3a"))
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[test]
    fn test_runs_in_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = SubprocessRunner::new()
            .run(&sh("touch marker").current_dir(dir.path()))
            .unwrap();
        assert!(out.success());
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_display_joins_args() {
        let spec = CommandSpec::new("java").args(["-jar", "VarScan.jar"]);
        assert_eq!(spec.to_string(), "java -jar VarScan.jar");
    }
}
