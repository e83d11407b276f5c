use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

/// Output equivalence policy applied by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// Line endings normalized, whole text trimmed, then string equality
    #[default]
    Exact,
    /// Line endings normalized, whole text trimmed, then whitespace-token equality
    Tokens,
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompareMode::Exact => write!(f, "exact"),
            CompareMode::Tokens => write!(f, "tokens"),
        }
    }
}

impl FromStr for CompareMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(CompareMode::Exact),
            "tokens" => Ok(CompareMode::Tokens),
            other => Err(format!(
                "invalid comparison mode '{}' (expected 'exact' or 'tokens')",
                other
            )),
        }
    }
}

/// Outcome of a single case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    Pass,
    /// Output did not match the expected output
    Fail,
    /// The program was killed after exceeding the per-case timeout
    Timeout,
    /// Nonzero exit while strict exit checking is enabled
    RuntimeError,
}

impl CaseStatus {
    pub fn is_pass(&self) -> bool {
        matches!(self, CaseStatus::Pass)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Pass => "PASS",
            CaseStatus::Fail => "FAIL",
            CaseStatus::Timeout => "TIMEOUT",
            CaseStatus::RuntimeError => "RUNTIME_ERROR",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the archive came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Gdrive,
    Zip,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceKind::Gdrive => write!(f, "gdrive"),
            SourceKind::Zip => write!(f, "zip"),
        }
    }
}

/// Result of running one case, as persisted in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub case: u32,
    pub status: CaseStatus,
    pub runtime_ms: f64,
    /// None when the process was killed (timeout or signal)
    pub return_code: Option<i32>,
    pub stdin_file: PathBuf,
    pub expected_file: PathBuf,
    pub stdout_len: usize,
    pub stderr_len: usize,
    pub stdout_sample: String,
}

/// Top-level record of one harness invocation, written as report.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub source: SourceKind,
    pub source_ref: String,
    pub zip: PathBuf,
    pub zip_sha256: String,
    pub task_id: String,
    pub cpp: PathBuf,
    pub compiler: String,
    pub compare_mode: CompareMode,
    pub timeout_seconds: u64,
    pub strict_exit: bool,
    pub anomalies: Vec<String>,
    pub results: Vec<CaseResult>,
}

impl RunManifest {
    /// Number of cases that did not pass
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.status.is_pass()).count()
    }
}
