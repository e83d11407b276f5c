/// Run Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Coordinate acquirer, discovery, engine, evaluator and report emitter.
///
/// **Architecture:**
/// 1. Acquire and unpack the archive into a scoped working directory
/// 2. Discover and pair cases (fatal on pairing gaps)
/// 3. Compile once (fatal on build failure)
/// 4. Run cases sequentially, evaluating each as it finishes
/// 5. Write reports to the persistent output directory
///
/// The working directory is a TempDir, so it is removed on every exit path.

use crate::acquire::{self, AcquiredArchive};
use crate::config::{HarnessConfig, RunSettings};
use crate::discovery::{self, Case, DiscoveryOutcome};
use crate::engine::{self, Toolchain};
use crate::error::HarnessError;
use crate::evaluator::{self, CaseExecution};
use crate::report::{self, CaseDiff};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zipjudge_common::types::{CaseResult, CaseStatus, RunManifest};

/// Name of the extraction directory inside the working directory
pub const STAGE_DIR: &str = "unzipped";

/// Execute a full harness run and write its reports
pub async fn execute_run(config: &HarnessConfig) -> Result<RunManifest> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    info!(
        run_id = %run_id,
        source = %config.source.kind(),
        compare_mode = %config.run.compare_mode,
        timeout_s = config.run.timeout.as_secs(),
        "Starting harness run"
    );

    let workdir = tempfile::Builder::new()
        .prefix("zipjudge-")
        .tempdir()
        .context("Failed to create working directory")?;

    // Step 1: Acquire and unpack
    let archive = acquire::acquire(&config.source, workdir.path()).await?;
    let stage = workdir.path().join(STAGE_DIR);
    std::fs::create_dir_all(&stage)
        .with_context(|| format!("Failed to create {}", stage.display()))?;
    acquire::extract_zip(&archive.path, &stage)?;

    // Step 2: Discover cases
    let files = discovery::collect_text_files(&stage)?;
    let outcome = discovery::discover_cases(&files);
    print_issues(&outcome);
    let anomalies = outcome.anomalies;
    let case_set = outcome.result.map_err(HarnessError::from)?;

    println!(
        "→ Discovered {} cases for task {}",
        case_set.cases.len(),
        case_set.task_id
    );

    // Step 3: Compile once
    let toolchain = Toolchain::resolve(&config.compiler, config.toolchain.flag_sets.clone());
    let exe = workdir.path().join(format!("{}_exec", case_set.task_id));
    println!("→ Compiling {} with {}", config.cpp.display(), toolchain.compiler());
    toolchain.compile(&config.cpp, &exe).await?;

    // Step 4: Run every case
    let (results, diffs) = execute_cases(&exe, &case_set.cases, &config.run).await?;

    let manifest = build_manifest(
        run_id,
        started_at,
        config,
        &archive,
        case_set.task_id,
        toolchain.compiler().to_string(),
        anomalies,
        results,
    );

    // Step 5: Persist reports outside the working directory
    let paths = report::write_reports(&config.outdir, &manifest, &diffs)?;
    info!(
        run_id = %run_id,
        cases = manifest.results.len(),
        failed = manifest.failed_count(),
        summary = %paths.summary.display(),
        csv = %paths.csv.display(),
        report = %paths.json.display(),
        diffs = paths.diffs.len(),
        "Run complete"
    );

    Ok(manifest)
}

/// Print anomalies and fatal discovery problems the way operators expect
fn print_issues(outcome: &DiscoveryOutcome) {
    let mut lines = outcome.anomalies.clone();
    if let Err(e) = &outcome.result {
        lines.extend(e.lines());
    }
    if lines.is_empty() {
        return;
    }

    println!("== ZIP issues detected ==");
    for line in &lines {
        println!("- {}", line);
    }
    for anomaly in &outcome.anomalies {
        warn!(anomaly = %anomaly, "Archive naming anomaly");
    }
}

/// Run each case to completion, one at a time
///
/// Timeouts are recorded as `TIMEOUT` and the loop moves on. Any other
/// engine failure (the program cannot be launched) aborts the run.
pub async fn execute_cases(
    program: &Path,
    cases: &[Case],
    settings: &RunSettings,
) -> Result<(Vec<CaseResult>, Vec<CaseDiff>)> {
    let mut results = Vec::with_capacity(cases.len());
    let mut diffs = Vec::new();

    println!("→ Executing {} test cases", cases.len());
    println!("  Timeout per test: {}s", settings.timeout.as_secs());
    println!();

    for case in cases {
        let input = tokio::fs::read(&case.input)
            .await
            .with_context(|| format!("Failed to read {}", case.input.display()))?;
        let expected_bytes = tokio::fs::read(&case.output)
            .await
            .with_context(|| format!("Failed to read {}", case.output.display()))?;
        let expected = String::from_utf8_lossy(&expected_bytes);

        let execution = match engine::run_case(program, &input, settings.timeout).await {
            Ok(output) => CaseExecution {
                case: case.number,
                stdout: output.stdout,
                stderr: output.stderr,
                stdout_len: output.stdout_len,
                stderr_len: output.stderr_len,
                exit_code: output.exit_code,
                runtime_ms: output.elapsed.as_secs_f64() * 1000.0,
                timed_out: false,
            },
            Err(HarnessError::ExecutionTimeout(limit)) => CaseExecution {
                case: case.number,
                stdout: String::new(),
                stderr: String::new(),
                stdout_len: 0,
                stderr_len: 0,
                exit_code: None,
                runtime_ms: limit.as_secs_f64() * 1000.0,
                timed_out: true,
            },
            Err(e) => return Err(e.into()),
        };

        let status = evaluator::evaluate_case(
            &execution,
            &expected,
            settings.compare_mode,
            settings.strict_exit,
        );

        println!(
            "  Test {} → {} ({:.1}ms)",
            case.number, status, execution.runtime_ms
        );
        match status {
            CaseStatus::Pass => println!("    ✓ Output matched"),
            CaseStatus::Fail => println!("    ✗ Output mismatch"),
            CaseStatus::Timeout => println!("    ✗ Timeout"),
            CaseStatus::RuntimeError => {
                println!("    ✗ Runtime error (exit code: {:?})", execution.exit_code)
            }
        }
        if !execution.stderr.is_empty() {
            debug!(
                case = execution.case,
                stderr_preview = execution.stderr.lines().next().unwrap_or(""),
                "Program wrote to stderr"
            );
        }

        if !status.is_pass() {
            diffs.push(report::unified_diff(case.number, &expected, &execution.stdout));
        }

        results.push(CaseResult {
            case: case.number,
            status,
            runtime_ms: report::round_ms(execution.runtime_ms),
            return_code: execution.exit_code,
            stdin_file: case.input.clone(),
            expected_file: case.output.clone(),
            stdout_len: execution.stdout_len,
            stderr_len: execution.stderr_len,
            stdout_sample: report::truncate_sample(&execution.stdout, report::SAMPLE_BYTES)
                .to_string(),
        });
    }

    println!();
    println!("→ All test cases executed");

    Ok((results, diffs))
}

#[allow(clippy::too_many_arguments)]
fn build_manifest(
    run_id: Uuid,
    started_at: chrono::DateTime<Utc>,
    config: &HarnessConfig,
    archive: &AcquiredArchive,
    task_id: String,
    compiler: String,
    anomalies: Vec<String>,
    results: Vec<CaseResult>,
) -> RunManifest {
    RunManifest {
        run_id,
        started_at,
        source: archive.kind,
        source_ref: config.source.reference(),
        zip: archive.path.clone(),
        zip_sha256: archive.sha256.clone(),
        task_id,
        cpp: std::fs::canonicalize(&config.cpp).unwrap_or_else(|_| config.cpp.clone()),
        compiler,
        compare_mode: config.run.compare_mode,
        timeout_seconds: config.run.timeout.as_secs(),
        strict_exit: config.run.strict_exit,
        anomalies,
        results,
    }
}
