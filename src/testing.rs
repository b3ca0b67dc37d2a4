//src/testing.rs
//
// In-memory stand-in for VarScan used by the unit tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::ExecError;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use crate::types::high_confidence_path;

pub const HC_HEADER: &str = "##fileformat=VCFv4.1\n##source=VarScan2\n#CHROM\tPOS\tID\tREF\tALT\n";

/// Pretends to be VarScan: records every call and writes the files the real
/// tool would leave behind.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<CommandSpec>>,
    events: Mutex<Vec<String>>,
    fail_when: Vec<String>,
    panic_when: Vec<String>,
    time_out_when: Vec<String>,
    spawn_error_when: Vec<String>,
    skip_outputs_when: Vec<String>,
    delay: Duration,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit 1 for any command line containing `needle`.
    pub fn fail_when(mut self, needle: &str) -> Self {
        self.fail_when.push(needle.to_string());
        self
    }

    pub fn panic_when(mut self, needle: &str) -> Self {
        self.panic_when.push(needle.to_string());
        self
    }

    /// Report a killed-on-timeout call for command lines containing `needle`.
    pub fn time_out_when(mut self, needle: &str) -> Self {
        self.time_out_when.push(needle.to_string());
        self
    }

    /// Fail to start command lines containing `needle`, as a missing java would.
    pub fn spawn_error_when(mut self, needle: &str) -> Self {
        self.spawn_error_when.push(needle.to_string());
        self
    }

    /// Exit 0 but write nothing for command lines containing `needle`.
    pub fn skip_outputs_when(mut self, needle: &str) -> Self {
        self.skip_outputs_when.push(needle.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }

    /// `start:<stage>:<file>` / `end:<stage>:<file>` in the order they happened.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// (stage, file argument) of every recorded call.
    pub fn stage_calls(&self) -> Vec<(String, String)> {
        self.calls().iter().filter_map(stage_of).collect()
    }
}

fn stage_of(spec: &CommandSpec) -> Option<(String, String)> {
    let pos = spec
        .args
        .iter()
        .position(|a| a == "somatic" || a == "processSomatic")?;
    Some((spec.args[pos].clone(), spec.args.get(pos + 1)?.clone()))
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, ExecError> {
        self.calls.lock().push(spec.clone());
        let line = spec.to_string();
        let matches = |needles: &[String]| needles.iter().any(|n| line.contains(n.as_str()));

        if matches(&self.spawn_error_when) {
            return Err(ExecError::Spawn {
                program: spec.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            });
        }
        let (stage, file) = stage_of(spec).unwrap_or_default();
        let file_name = Path::new(&file)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.events.lock().push(format!("start:{stage}:{file_name}"));
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if matches(&self.panic_when) {
            panic!("scripted panic for {line}");
        }
        if matches(&self.time_out_when) {
            self.events.lock().push(format!("end:{stage}:{file_name}"));
            return Ok(CommandOutput {
                exit_code: None,
                stdout: "partial\n".to_string(),
                stderr: String::new(),
                timed_out: true,
            });
        }

        let failed = matches(&self.fail_when);
        let write = !failed && !matches(&self.skip_outputs_when);
        if write {
            let dir = spec.current_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            match stage.as_str() {
                "somatic" => {
                    let pos = spec.args.iter().position(|a| a == "somatic").unwrap_or(0);
                    let base = spec.args.get(pos + 2).cloned().unwrap_or_default();
                    for kind in ["snp", "indel"] {
                        let path = dir.join(format!("{base}.{kind}.vcf"));
                        fs::write(path, format!("{HC_HEADER}chr1\t1\t{base}.{kind}\tA\tC\n"))
                            .expect("write candidate calls");
                    }
                }
                "processSomatic" => {
                    let hc = high_confidence_path(&dir.join(&file));
                    fs::write(hc, format!("{HC_HEADER}chr1\t100\t{file_name}\tA\tT\n"))
                        .expect("write high-confidence calls");
                }
                _ => {}
            }
        }

        self.events.lock().push(format!("end:{stage}:{file_name}"));
        Ok(CommandOutput {
            exit_code: Some(if failed { 1 } else { 0 }),
            stdout: String::new(),
            stderr: if failed { format!("scripted failure: {line}") } else { String::new() },
            timed_out: false,
        })
    }
}
