/// Case Discovery
///
/// Rebuilds the ordered case list from the flat (or nested) file listing of an
/// extracted archive. `discover_cases` is a pure function over paths: naming
/// irregularities are collected as anomalies on the side, while the result
/// itself is either the paired case set or a hard `DiscoveryError`.

use crate::error::DiscoveryError;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zipjudge_common::naming::{parse_fixture_name, FixtureKind, NameError, FIXTURE_EXTENSION};

/// One runnable case: both halves are present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub number: u32,
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Paired cases of one bundle, ordered by case number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSet {
    /// Canonical bundle identity
    pub task_id: String,
    pub cases: Vec<Case>,
}

#[derive(Debug)]
pub struct DiscoveryOutcome {
    /// Non-fatal naming irregularities, in discovery order
    pub anomalies: Vec<String>,
    pub result: Result<CaseSet, DiscoveryError>,
}

/// Every `.txt` file below `root`, sorted by path
pub fn collect_text_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_text = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == FIXTURE_EXTENSION);
        if is_text {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Match file names against the fixture grammar and pair inputs with outputs
pub fn discover_cases<I, P>(files: I) -> DiscoveryOutcome
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut anomalies = Vec::new();
    let mut inputs: BTreeMap<u32, PathBuf> = BTreeMap::new();
    let mut outputs: BTreeMap<u32, PathBuf> = BTreeMap::new();
    let mut ids_seen: BTreeSet<String> = BTreeSet::new();

    for file in files {
        let path = file.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let parsed = match parse_fixture_name(&name) {
            Ok(parsed) => parsed,
            Err(NameError::NoMatch) => {
                anomalies.push(format!("IGNORING unexpected file name: {}", name));
                continue;
            }
            Err(NameError::CaseOutOfRange(num)) => {
                anomalies.push(format!(
                    "IGNORING {}: case number {} is too large",
                    name, num
                ));
                continue;
            }
        };

        ids_seen.insert(parsed.task_id);
        let slot = match parsed.kind {
            FixtureKind::Input => &mut inputs,
            FixtureKind::Output => &mut outputs,
        };
        if slot.contains_key(&parsed.case) {
            anomalies.push(format!(
                "Duplicate {} file for case {}: {}",
                parsed.kind, parsed.case, name
            ));
            continue;
        }
        slot.insert(parsed.case, path.to_path_buf());
    }

    // BTreeSet iterates in lexicographic order, so the first id is canonical
    let task_id = match ids_seen.iter().next() {
        Some(id) => id.clone(),
        None => {
            return DiscoveryOutcome {
                anomalies,
                result: Err(DiscoveryError::NoTestFiles),
            }
        }
    };
    if ids_seen.len() > 1 {
        anomalies.push(format!(
            "Multiple IDs detected in ZIP: {:?}",
            ids_seen.iter().collect::<Vec<_>>()
        ));
    }

    let missing_inputs: Vec<u32> = outputs
        .keys()
        .filter(|n| !inputs.contains_key(n))
        .copied()
        .collect();
    let missing_outputs: Vec<u32> = inputs
        .keys()
        .filter(|n| !outputs.contains_key(n))
        .copied()
        .collect();

    if !missing_inputs.is_empty() || !missing_outputs.is_empty() {
        return DiscoveryOutcome {
            anomalies,
            result: Err(DiscoveryError::PairingGaps {
                missing_inputs,
                missing_outputs,
            }),
        };
    }

    // Key sets are identical here, so both maps iterate in the same order
    let cases = inputs
        .into_iter()
        .zip(outputs.into_values())
        .map(|((number, input), output)| Case {
            number,
            input,
            output,
        })
        .collect();

    DiscoveryOutcome {
        anomalies,
        result: Ok(CaseSet { task_id, cases }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/stage").join(n)).collect()
    }

    #[test]
    fn test_pairs_all_cases_in_numeric_order() {
        let outcome = discover_cases(paths(&[
            "1942G_Input_TestCase_10.txt",
            "1942G_Output_TestCase_2.txt",
            "1942G_Input_TestCase_2.txt",
            "1942G_Output_TestCase_10.txt",
            "1942G_Input_TestCase_1.txt",
            "1942G_Output_TestCase_1.txt",
        ]));

        assert!(outcome.anomalies.is_empty());
        let set = outcome.result.unwrap();
        assert_eq!(set.task_id, "1942G");
        let numbers: Vec<u32> = set.cases.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
        assert_eq!(
            set.cases[2].input,
            PathBuf::from("/stage/1942G_Input_TestCase_10.txt")
        );
        assert_eq!(
            set.cases[2].output,
            PathBuf::from("/stage/1942G_Output_TestCase_10.txt")
        );
    }

    #[test]
    fn test_unexpected_names_are_anomalies_not_errors() {
        let outcome = discover_cases(paths(&[
            "notes.txt",
            "A_Input_TestCase_1.txt",
            "A_Output_TestCase_1.txt",
        ]));

        assert_eq!(
            outcome.anomalies,
            vec!["IGNORING unexpected file name: notes.txt".to_string()]
        );
        assert_eq!(outcome.result.unwrap().cases.len(), 1);
    }

    #[test]
    fn test_no_matching_files() {
        let outcome = discover_cases(paths(&["readme.txt"]));
        assert_eq!(outcome.result.unwrap_err(), DiscoveryError::NoTestFiles);
        assert_eq!(outcome.anomalies.len(), 1);

        let empty: Vec<PathBuf> = Vec::new();
        assert_eq!(discover_cases(empty).result.unwrap_err(), DiscoveryError::NoTestFiles);
    }

    #[test]
    fn test_pairing_gaps_are_fatal() {
        let outcome = discover_cases(paths(&[
            "A_Input_TestCase_1.txt",
            "A_Output_TestCase_1.txt",
            "A_Input_TestCase_2.txt",
            "A_Output_TestCase_3.txt",
        ]));

        assert_eq!(
            outcome.result.unwrap_err(),
            DiscoveryError::PairingGaps {
                missing_inputs: vec![3],
                missing_outputs: vec![2],
            }
        );
    }

    #[test]
    fn test_multiple_ids_pick_smallest() {
        let outcome = discover_cases(paths(&[
            "beta_Input_TestCase_1.txt",
            "alpha_Output_TestCase_1.txt",
        ]));

        assert_eq!(
            outcome.anomalies,
            vec![r#"Multiple IDs detected in ZIP: ["alpha", "beta"]"#.to_string()]
        );
        let set = outcome.result.unwrap();
        assert_eq!(set.task_id, "alpha");
        assert_eq!(set.cases.len(), 1);
    }

    #[test]
    fn test_duplicate_case_keeps_first() {
        let outcome = discover_cases(vec![
            PathBuf::from("/stage/a/X_Input_TestCase_1.txt"),
            PathBuf::from("/stage/b/X_Input_TestCase_1.txt"),
            PathBuf::from("/stage/a/X_Output_TestCase_1.txt"),
        ]);

        assert_eq!(
            outcome.anomalies,
            vec!["Duplicate Input file for case 1: X_Input_TestCase_1.txt".to_string()]
        );
        let set = outcome.result.unwrap();
        assert_eq!(set.cases[0].input, PathBuf::from("/stage/a/X_Input_TestCase_1.txt"));
    }

    #[test]
    fn test_oversized_case_number_is_ignored() {
        let outcome = discover_cases(paths(&[
            "X_Input_TestCase_99999999999.txt",
            "X_Input_TestCase_1.txt",
            "X_Output_TestCase_1.txt",
        ]));

        assert_eq!(outcome.anomalies.len(), 1);
        assert!(outcome.anomalies[0].contains("too large"));
        assert_eq!(outcome.result.unwrap().cases.len(), 1);
    }

    #[test]
    fn test_collect_text_files_recurses_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("T_TestCases");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("T_Output_TestCase_1.txt"), "1").unwrap();
        std::fs::write(dir.path().join("T_Input_TestCase_1.txt"), "1").unwrap();
        std::fs::write(dir.path().join("image.png"), "x").unwrap();

        let files = collect_text_files(dir.path()).unwrap();
        assert_eq!(
            files,
            vec![
                dir.path().join("T_Input_TestCase_1.txt"),
                nested.join("T_Output_TestCase_1.txt"),
            ]
        );

        let set = discover_cases(&files).result.unwrap();
        assert_eq!(set.cases.len(), 1);
    }
}
