// Failure taxonomy of a harness run
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the pipeline stages.
///
/// `Acquisition`, `Discovery` and `Build` abort the whole run before any
/// report is written. `ExecutionTimeout` is per case: the executor records it
/// as a `TIMEOUT` status and moves on.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{0}")]
    Acquisition(String),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Compilation failed with {compiler}:\n{stderr}")]
    Build { compiler: String, stderr: String },

    #[error("Execution timed out after {}s", .0.as_secs_f64())]
    ExecutionTimeout(Duration),

    #[error("Failed to launch program under test: {0}")]
    Launch(#[source] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("No properly named test files found.")]
    NoTestFiles,

    #[error("{}", describe_gaps(.missing_inputs, .missing_outputs))]
    PairingGaps {
        missing_inputs: Vec<u32>,
        missing_outputs: Vec<u32>,
    },
}

impl DiscoveryError {
    /// Operator-facing lines, one per problem
    pub fn lines(&self) -> Vec<String> {
        match self {
            DiscoveryError::NoTestFiles => vec![self.to_string()],
            DiscoveryError::PairingGaps {
                missing_inputs,
                missing_outputs,
            } => gap_lines(missing_inputs, missing_outputs),
        }
    }
}

fn gap_lines(missing_inputs: &[u32], missing_outputs: &[u32]) -> Vec<String> {
    let mut lines = Vec::new();
    if !missing_inputs.is_empty() {
        lines.push(format!("Missing input files for cases: {:?}", missing_inputs));
    }
    if !missing_outputs.is_empty() {
        lines.push(format!("Missing output files for cases: {:?}", missing_outputs));
    }
    lines
}

fn describe_gaps(missing_inputs: &[u32], missing_outputs: &[u32]) -> String {
    gap_lines(missing_inputs, missing_outputs).join("; ")
}
