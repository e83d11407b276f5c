/// Execution Engine - Build and Run the Program Under Test
///
/// **Core Responsibility:**
/// Compile the solution once, then run it with test inputs and capture raw
/// outputs.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to execute (local subprocess with piped stdio)
/// - Engine does NOT know comparison rules
/// - Engine returns raw outputs for the evaluator to judge
///
/// There is no sandbox: the program runs with the harness's own privileges.

use crate::error::HarnessError;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Compilers tried when the requested one is not installed
const FALLBACK_COMPILERS: [&str; 2] = ["g++", "clang++"];

/// Raw result of one finished run
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    /// Captured byte counts, before any lossy UTF-8 decoding
    pub stdout_len: usize,
    pub stderr_len: usize,
    /// None when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

/// A resolved compiler plus the flag sets to try, in order
#[derive(Debug, Clone)]
pub struct Toolchain {
    compiler: String,
    flag_sets: Vec<Vec<String>>,
}

/// Pick the requested compiler if it is installed, otherwise the first
/// installed fallback; keep the requested name when nothing is found so the
/// build error names it.
pub fn resolve_compiler(requested: &str) -> String {
    if which::which(requested).is_ok() {
        return requested.to_string();
    }
    for fallback in FALLBACK_COMPILERS {
        if which::which(fallback).is_ok() {
            warn!(requested = %requested, using = %fallback, "Requested compiler not found, falling back");
            return fallback.to_string();
        }
    }
    requested.to_string()
}

impl Toolchain {
    pub fn new(compiler: impl Into<String>, flag_sets: Vec<Vec<String>>) -> Self {
        Self {
            compiler: compiler.into(),
            flag_sets,
        }
    }

    /// Resolve `requested` against PATH before building the toolchain
    pub fn resolve(requested: &str, flag_sets: Vec<Vec<String>>) -> Self {
        Self::new(resolve_compiler(requested), flag_sets)
    }

    /// Compiler identity recorded in the manifest
    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    /// Compile `source` into `exe`, trying each flag set until one succeeds
    ///
    /// ## Returns
    /// Index of the flag set that compiled, or `BuildError` carrying the last
    /// compiler diagnostics.
    #[tracing::instrument(skip(self), fields(compiler = %self.compiler))]
    pub async fn compile(&self, source: &Path, exe: &Path) -> Result<usize, HarnessError> {
        let start_time = Instant::now();
        let mut last_err = String::new();

        for (attempt, flags) in self.flag_sets.iter().enumerate() {
            debug!(attempt = attempt, flags = ?flags, "Invoking compiler");

            let output = Command::new(&self.compiler)
                .args(flags)
                .arg(source)
                .arg("-o")
                .arg(exe)
                .stdin(Stdio::null())
                .output()
                .await;

            match output {
                Ok(output) if output.status.success() => {
                    let compilation_time_ms = start_time.elapsed().as_millis() as u64;
                    println!("    ✓ Compilation successful in {}ms", compilation_time_ms);
                    info!(
                        compilation_time_ms = compilation_time_ms,
                        attempt = attempt,
                        "Compilation succeeded"
                    );
                    return Ok(attempt);
                }
                Ok(output) => {
                    last_err = String::from_utf8_lossy(&output.stderr).into_owned();
                    warn!(
                        attempt = attempt,
                        error_preview = last_err.lines().next().unwrap_or(""),
                        "Compilation attempt failed"
                    );
                }
                Err(e) => {
                    last_err = format!("failed to run {}: {}", self.compiler, e);
                    warn!(attempt = attempt, error = %e, "Compiler could not be started");
                }
            }
        }

        println!("    ✗ Compilation failed");
        Err(HarnessError::Build {
            compiler: self.compiler.clone(),
            stderr: last_err,
        })
    }
}

/// Run `program` with `input` on stdin, bounded by `timeout`
///
/// **Guarantees:**
/// - Hard timeout: enforced via tokio::time::timeout; the child is killed when
///   the wait is abandoned (kill_on_drop)
/// - A program that exits without reading its stdin is not an error
/// - Exit code is captured but not interpreted here
pub async fn run_case(
    program: &Path,
    input: &[u8],
    timeout: Duration,
) -> Result<ExecutionOutput, HarnessError> {
    let start_time = Instant::now();

    let mut child = Command::new(program)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(HarnessError::Launch)?;

    // Feed stdin concurrently so a program that writes before reading
    // cannot deadlock against a full pipe.
    let stdin = child.stdin.take();
    let input = input.to_vec();
    let feeder = tokio::spawn(async move {
        if let Some(mut stdin) = stdin {
            // BrokenPipe just means the program stopped reading
            let _ = stdin.write_all(&input).await;
        }
    });

    let result = tokio::time::timeout(timeout, child.wait_with_output()).await;
    let elapsed = start_time.elapsed();

    match result {
        Ok(Ok(output)) => {
            let _ = feeder.await;
            debug!(
                execution_ms = elapsed.as_millis() as u64,
                exit_code = ?output.status.code(),
                "Program finished"
            );
            Ok(ExecutionOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                stdout_len: output.stdout.len(),
                stderr_len: output.stderr.len(),
                exit_code: output.status.code(),
                elapsed,
            })
        }
        Ok(Err(e)) => {
            feeder.abort();
            Err(HarnessError::Launch(e))
        }
        Err(_) => {
            // The wait future owned the child; dropping it killed the process
            feeder.abort();
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "Execution timed out - program killed"
            );
            Err(HarnessError::ExecutionTimeout(timeout))
        }
    }
}
