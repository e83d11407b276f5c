use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Fixture naming semantics - defines only the file name grammar
/// Ensures the harness and the authoring CLI never drift:
/// `<TaskId>_<Input|Output>_TestCase_<N>.txt`

pub const CASE_MARKER: &str = "TestCase";
pub const FIXTURE_EXTENSION: &str = "txt";

lazy_static! {
    static ref FIXTURE_NAME_RE: Regex =
        Regex::new(r"^(?P<id>[A-Za-z0-9]+)_(?P<kind>Input|Output)_TestCase_(?P<num>\d+)\.txt$")
            .unwrap();
    static ref TASK_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9]+$").unwrap();
}

/// Which half of a case a fixture file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FixtureKind {
    Input,
    Output,
}

impl FixtureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureKind::Input => "Input",
            FixtureKind::Output => "Output",
        }
    }
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file name that matched the fixture grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureName {
    pub task_id: String,
    pub kind: FixtureKind,
    pub case: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("file name does not follow <id>_<Input|Output>_TestCase_<N>.txt")]
    NoMatch,
    #[error("case number {0} is out of range")]
    CaseOutOfRange(String),
}

/// Parse a bare file name (no directory part) against the fixture grammar
pub fn parse_fixture_name(file_name: &str) -> Result<FixtureName, NameError> {
    let caps = FIXTURE_NAME_RE
        .captures(file_name)
        .ok_or(NameError::NoMatch)?;

    let kind = match &caps["kind"] {
        "Input" => FixtureKind::Input,
        _ => FixtureKind::Output,
    };
    let num = &caps["num"];
    let case = num
        .parse::<u32>()
        .map_err(|_| NameError::CaseOutOfRange(num.to_string()))?;

    Ok(FixtureName {
        task_id: caps["id"].to_string(),
        kind,
        case,
    })
}

/// Generate the deterministic file name for one fixture
pub fn fixture_name(task_id: &str, kind: FixtureKind, case: u32) -> String {
    format!(
        "{}_{}_{}_{}.{}",
        task_id, kind, CASE_MARKER, case, FIXTURE_EXTENSION
    )
}

/// Folder holding the fixtures of one task before packing
pub fn fixture_dir_name(task_id: &str) -> String {
    format!("{}_TestCases", task_id)
}

/// Archive produced by packing a fixture folder
pub fn archive_name(task_id: &str) -> String {
    format!("{}.zip", fixture_dir_name(task_id))
}

pub fn is_valid_task_id(task_id: &str) -> bool {
    TASK_ID_RE.is_match(task_id)
}
