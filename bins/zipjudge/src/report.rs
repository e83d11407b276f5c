// Report Emitter
//
// Writes summary.txt, report.csv, report.json and diffs/diff_<N>.patch into
// the persistent output directory. Nothing here runs before every case has
// finished, so an aborted run leaves the previous reports untouched.
use crate::evaluator::normalize_newlines;
use anyhow::{Context, Result};
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};
use zipjudge_common::types::{CaseResult, RunManifest};

pub const SUMMARY_FILE: &str = "summary.txt";
pub const CSV_FILE: &str = "report.csv";
pub const JSON_FILE: &str = "report.json";
pub const DIFFS_DIR: &str = "diffs";
/// Bytes of stdout kept in the manifest per case
pub const SAMPLE_BYTES: usize = 2000;

/// Unified diff of one non-passing case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDiff {
    pub case: u32,
    pub patch: String,
}

pub fn summary_line(results: &[CaseResult]) -> String {
    let failed = results.iter().filter(|r| !r.status.is_pass()).count();
    if failed == 0 {
        "All passed".to_string()
    } else {
        format!("{} out of {} failed", failed, results.len())
    }
}

pub fn render_csv(results: &[CaseResult]) -> String {
    let mut lines = vec!["case,status,runtime_ms,return_code".to_string()];
    for r in results {
        let return_code = r.return_code.map(|c| c.to_string()).unwrap_or_default();
        // Debug keeps the fractional part of whole values ("7.0", not "7")
        lines.push(format!("{},{},{:?},{}", r.case, r.status, r.runtime_ms, return_code));
    }
    lines.join("\n") + "\n"
}

/// Longest prefix of `text` within `max_bytes` that ends on a char boundary
pub fn truncate_sample(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Milliseconds rounded to 3 decimals
pub fn round_ms(ms: f64) -> f64 {
    (ms * 1000.0).round() / 1000.0
}

/// Line diff between expected and actual output, both line-ending normalized
pub fn unified_diff(case: u32, expected: &str, actual: &str) -> CaseDiff {
    let expected = normalize_newlines(expected);
    let actual = normalize_newlines(actual);
    let patch = TextDiff::from_lines(&expected, &actual)
        .unified_diff()
        .context_radius(3)
        .missing_newline_hint(false)
        .header(&format!("expected_{}.txt", case), &format!("got_{}.txt", case))
        .to_string();
    CaseDiff { case, patch }
}

/// Paths of the written artifacts
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub summary: PathBuf,
    pub csv: PathBuf,
    pub json: PathBuf,
    pub diffs: Vec<PathBuf>,
}

/// Write every artifact, replacing earlier ones
pub fn write_reports(outdir: &Path, manifest: &RunManifest, diffs: &[CaseDiff]) -> Result<ReportPaths> {
    fs::create_dir_all(outdir)
        .with_context(|| format!("Failed to create output directory: {}", outdir.display()))?;

    // Stale patches from an earlier run would read as current failures
    let diffs_dir = outdir.join(DIFFS_DIR);
    if diffs_dir.exists() {
        fs::remove_dir_all(&diffs_dir)
            .with_context(|| format!("Failed to clear {}", diffs_dir.display()))?;
    }
    fs::create_dir_all(&diffs_dir)
        .with_context(|| format!("Failed to create {}", diffs_dir.display()))?;

    let summary = outdir.join(SUMMARY_FILE);
    fs::write(&summary, summary_line(&manifest.results) + "\n")
        .with_context(|| format!("Failed to write {}", summary.display()))?;

    let csv = outdir.join(CSV_FILE);
    fs::write(&csv, render_csv(&manifest.results))
        .with_context(|| format!("Failed to write {}", csv.display()))?;

    let json = outdir.join(JSON_FILE);
    let json_content =
        serde_json::to_string_pretty(manifest).context("Failed to serialize run manifest")?;
    fs::write(&json, json_content).with_context(|| format!("Failed to write {}", json.display()))?;

    let mut diff_paths = Vec::with_capacity(diffs.len());
    for diff in diffs {
        let path = diffs_dir.join(format!("diff_{}.patch", diff.case));
        fs::write(&path, &diff.patch)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        diff_paths.push(path);
    }

    Ok(ReportPaths {
        summary,
        csv,
        json,
        diffs: diff_paths,
    })
}
