// Toolchain configuration shared by the harness
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding the default compiler
pub const COMPILER_ENV: &str = "CF_CXX";
pub const DEFAULT_COMPILER: &str = "g++-14";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_SOURCE: &str = "solution.cpp";
pub const DEFAULT_OUTDIR: &str = "results";

/// Compiler flag sets, tried in order until one compiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    pub flag_sets: Vec<Vec<String>>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        let set = |std: &str| vec![std.to_string(), "-O2".to_string(), "-pipe".to_string()];
        Self {
            flag_sets: vec![set("-std=gnu++17"), set("-std=c++17")],
        }
    }
}

impl ToolchainConfig {
    /// Load flag sets from a JSON file
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Toolchain config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: ToolchainConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        if config.flag_sets.is_empty() {
            bail!("Toolchain config must define at least one flag set");
        }

        Ok(config)
    }

    /// Load from a path when given, fall back to the built-in flag sets otherwise
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
