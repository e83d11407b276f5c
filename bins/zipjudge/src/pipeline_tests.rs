/// End-to-end tests for the harness pipeline
///
/// A fake compiler script "compiles" by copying the source to the output path,
/// so the program under test can be a shell script and the whole run
/// (acquire → discover → build → execute → report) is exercised without a
/// C++ toolchain.

#[cfg(all(test, unix))]
mod pipeline {
    use crate::config::{ArchiveSource, HarnessConfig, RunSettings};
    use crate::error::{DiscoveryError, HarnessError};
    use crate::executor::execute_run;
    use crate::report::{CSV_FILE, DIFFS_DIR, JSON_FILE, SUMMARY_FILE};
    use sha2::{Digest, Sha256};
    use std::fs::{self, File};
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use zip::write::SimpleFileOptions;
    use zipjudge_common::config::ToolchainConfig;
    use zipjudge_common::naming::{fixture_name, FixtureKind};
    use zipjudge_common::types::{CaseStatus, CompareMode};

    const FAKE_COMPILER: &str = r#"out=""; src=""
while [ $# -gt 0 ]; do
  case "$1" in -o) out="$2"; shift;; -*) ;; *) src="$1";; esac
  shift
done
cp "$src" "$out""#;

    /// Doubles the number on stdin; "sleep" hangs until killed
    const DOUBLER: &str = r#"read n
if [ "$n" = "sleep" ]; then exec sleep 30; fi
echo $((n * 2))"#;

    fn write_script(path: &Path, body: &str) {
        fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    /// Zip of (case, input, expected) triples; `None` leaves that half out
    fn write_bundle(path: &Path, task_id: &str, cases: &[(u32, Option<&str>, Option<&str>)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (case, input, expected) in cases {
            if let Some(input) = input {
                zip.start_file(fixture_name(task_id, FixtureKind::Input, *case), SimpleFileOptions::default())
                    .unwrap();
                zip.write_all(input.as_bytes()).unwrap();
            }
            if let Some(expected) = expected {
                zip.start_file(fixture_name(task_id, FixtureKind::Output, *case), SimpleFileOptions::default())
                    .unwrap();
                zip.write_all(expected.as_bytes()).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
        compiler: PathBuf,
        solution: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let compiler = root.join("fakecc.sh");
        write_script(&compiler, FAKE_COMPILER);
        let solution = root.join("solution.cpp");
        write_script(&solution, DOUBLER);
        Fixture {
            _dir: dir,
            root,
            compiler,
            solution,
        }
    }

    fn make_config(fx: &Fixture, zip: &Path, timeout_s: u64) -> HarnessConfig {
        HarnessConfig {
            source: ArchiveSource::Local(zip.to_path_buf()),
            cpp: fx.solution.clone(),
            compiler: fx.compiler.to_string_lossy().into_owned(),
            toolchain: ToolchainConfig::default(),
            run: RunSettings {
                compare_mode: CompareMode::Exact,
                timeout: Duration::from_secs(timeout_s),
                strict_exit: false,
            },
            outdir: fx.root.join("results"),
        }
    }

    /// case,status,return_code columns of report.csv
    fn outcome_columns(csv: &str) -> Vec<String> {
        csv.lines()
            .map(|line| {
                let cols: Vec<&str> = line.split(',').collect();
                format!("{},{},{}", cols[0], cols[1], cols[3])
            })
            .collect()
    }

    #[tokio::test]
    async fn test_full_run_writes_all_artifacts() {
        let fx = fixture();
        let zip = fx.root.join("T_TestCases.zip");
        write_bundle(
            &zip,
            "T",
            &[
                (1, Some("5\n"), Some("10\n")),
                (2, Some("21\n"), Some("42\r\n")),
                (3, Some("1\n"), Some("3\n")),
            ],
        );
        let config = make_config(&fx, &zip, 5);

        let manifest = execute_run(&config).await.unwrap();

        assert_eq!(manifest.task_id, "T");
        let statuses: Vec<CaseStatus> = manifest.results.iter().map(|r| r.status).collect();
        assert_eq!(statuses, vec![CaseStatus::Pass, CaseStatus::Pass, CaseStatus::Fail]);
        assert_eq!(manifest.results[2].stdout_sample, "2\n");
        assert_eq!(manifest.results[2].return_code, Some(0));
        assert_eq!(manifest.results[2].stdout_len, 2);

        let outdir = &config.outdir;
        assert_eq!(
            fs::read_to_string(outdir.join(SUMMARY_FILE)).unwrap(),
            "1 out of 3 failed\n"
        );
        let csv = fs::read_to_string(outdir.join(CSV_FILE)).unwrap();
        assert_eq!(
            outcome_columns(&csv),
            vec!["case,status,return_code", "1,PASS,0", "2,PASS,0", "3,FAIL,0"]
        );

        let patch = fs::read_to_string(outdir.join(DIFFS_DIR).join("diff_3.patch")).unwrap();
        assert!(patch.contains("--- expected_3.txt"));
        assert!(patch.contains("-3"));
        assert!(patch.contains("+2"));
        assert!(!outdir.join(DIFFS_DIR).join("diff_1.patch").exists());

        // hash recorded in the manifest matches the archive bytes
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(outdir.join(JSON_FILE)).unwrap()).unwrap();
        let expected_hash = hex::encode(Sha256::digest(fs::read(&zip).unwrap()));
        assert_eq!(json["zip_sha256"], expected_hash);
        assert_eq!(json["source"], "zip");
        assert_eq!(json["compare_mode"], "exact");
    }

    #[tokio::test]
    async fn test_rerun_is_deterministic() {
        let fx = fixture();
        let zip = fx.root.join("T_TestCases.zip");
        write_bundle(
            &zip,
            "T",
            &[(1, Some("2\n"), Some("4\n")), (2, Some("3\n"), Some("7\n"))],
        );
        let config = make_config(&fx, &zip, 5);

        execute_run(&config).await.unwrap();
        let first = fs::read_to_string(config.outdir.join(CSV_FILE)).unwrap();
        execute_run(&config).await.unwrap();
        let second = fs::read_to_string(config.outdir.join(CSV_FILE)).unwrap();

        assert_eq!(outcome_columns(&first), outcome_columns(&second));
    }

    #[tokio::test]
    async fn test_timeout_does_not_stop_later_cases() {
        let fx = fixture();
        let zip = fx.root.join("T_TestCases.zip");
        write_bundle(
            &zip,
            "T",
            &[
                (1, Some("sleep\n"), Some("0\n")),
                (2, Some("4\n"), Some("8\n")),
            ],
        );
        let config = make_config(&fx, &zip, 1);

        let manifest = execute_run(&config).await.unwrap();

        assert_eq!(manifest.results[0].status, CaseStatus::Timeout);
        assert_eq!(manifest.results[0].return_code, None);
        assert_eq!(manifest.results[1].status, CaseStatus::Pass);
        assert_eq!(
            fs::read_to_string(config.outdir.join(SUMMARY_FILE)).unwrap(),
            "1 out of 2 failed\n"
        );
    }

    #[tokio::test]
    async fn test_tokens_mode() {
        let fx = fixture();
        let solution = fx.root.join("wrapped.cpp");
        write_script(&solution, "printf '1\\n2   3\\n'");
        let zip = fx.root.join("T_TestCases.zip");
        write_bundle(&zip, "T", &[(1, Some(""), Some("1 2 3"))]);

        let mut config = make_config(&fx, &zip, 5);
        config.cpp = solution;
        config.run.compare_mode = CompareMode::Tokens;

        let manifest = execute_run(&config).await.unwrap();
        assert_eq!(manifest.results[0].status, CaseStatus::Pass);

        config.run.compare_mode = CompareMode::Exact;
        let manifest = execute_run(&config).await.unwrap();
        assert_eq!(manifest.results[0].status, CaseStatus::Fail);
    }

    #[tokio::test]
    async fn test_pairing_gap_aborts_before_reports() {
        let fx = fixture();
        let zip = fx.root.join("T_TestCases.zip");
        write_bundle(
            &zip,
            "T",
            &[(1, Some("1\n"), Some("2\n")), (2, Some("2\n"), None)],
        );
        let config = make_config(&fx, &zip, 5);

        let err = execute_run(&config).await.unwrap_err();

        match err.downcast_ref::<HarnessError>() {
            Some(HarnessError::Discovery(DiscoveryError::PairingGaps {
                missing_inputs,
                missing_outputs,
            })) => {
                assert!(missing_inputs.is_empty());
                assert_eq!(missing_outputs, &vec![2]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!config.outdir.exists());
    }

    #[tokio::test]
    async fn test_build_failure_aborts_before_reports() {
        let fx = fixture();
        let broken = fx.root.join("brokencc.sh");
        write_script(&broken, "echo 'error: boom' 1>&2; exit 1");
        let zip = fx.root.join("T_TestCases.zip");
        write_bundle(&zip, "T", &[(1, Some("1\n"), Some("2\n"))]);

        let mut config = make_config(&fx, &zip, 5);
        config.compiler = broken.to_string_lossy().into_owned();

        let err = execute_run(&config).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Build { .. })
        ));
        assert!(!config.outdir.exists());
    }

    #[tokio::test]
    async fn test_empty_archive_is_a_discovery_error() {
        let fx = fixture();
        let zip = fx.root.join("empty.zip");
        let mut writer = zip::ZipWriter::new(File::create(&zip).unwrap());
        writer.start_file("readme.txt", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"nothing here").unwrap();
        writer.finish().unwrap();

        let err = execute_run(&make_config(&fx, &zip, 5)).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Discovery(DiscoveryError::NoTestFiles))
        ));
    }
}
