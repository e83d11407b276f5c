/// Output Evaluator - Comparison Logic
///
/// **Core Responsibility:**
/// Compare captured program output against the expected output and assign a
/// status to each case.
///
/// **Critical Properties:**
/// - Knows nothing about subprocesses or archives
/// - Pure function: (execution output, expected output, mode) → status
///
/// **Normalization Rules (both modes):**
/// - Line endings: CRLF and lone CR become LF
/// - Leading/trailing whitespace of the whole text: trimmed
/// - Case sensitivity: YES (exact match required)
/// - Floating-point tolerance: NO
///
/// `tokens` mode additionally splits on any whitespace run, so line wrapping
/// and spacing between tokens no longer matter. Token order still does.

use zipjudge_common::types::{CaseStatus, CompareMode};

/// Raw execution output for a single case
/// Produced by the engine, consumed by the evaluator
#[derive(Debug, Clone)]
pub struct CaseExecution {
    pub case: u32,
    pub stdout: String,
    pub stderr: String,
    pub stdout_len: usize,
    pub stderr_len: usize,
    pub exit_code: Option<i32>,
    pub runtime_ms: f64,
    pub timed_out: bool,
}

/// Replace CRLF and lone CR with LF
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn normalize_output(text: &str) -> String {
    normalize_newlines(text).trim().to_string()
}

/// Whitespace-separated tokens of a normalized output
pub fn tokens(text: &str) -> Vec<String> {
    normalize_output(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Equivalence verdict between actual and expected output
pub fn outputs_match(actual: &str, expected: &str, mode: CompareMode) -> bool {
    match mode {
        CompareMode::Exact => normalize_output(actual) == normalize_output(expected),
        CompareMode::Tokens => tokens(actual) == tokens(expected),
    }
}

/// Evaluate a single case execution
///
/// Priority:
/// 1. Timeouts
/// 2. Nonzero exit, only when `strict_exit` is set
/// 3. Output comparison
///
/// Without `strict_exit` the exit code is diagnostic only: a program that
/// prints the right answer and then crashes still passes.
pub fn evaluate_case(
    execution: &CaseExecution,
    expected: &str,
    mode: CompareMode,
    strict_exit: bool,
) -> CaseStatus {
    if execution.timed_out {
        CaseStatus::Timeout
    } else if strict_exit && execution.exit_code != Some(0) {
        CaseStatus::RuntimeError
    } else if outputs_match(&execution.stdout, expected, mode) {
        CaseStatus::Pass
    } else {
        CaseStatus::Fail
    }
}
