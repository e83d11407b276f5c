// Run configuration for the harness
//
// Everything read from the command line and the environment is folded into a
// single HarnessConfig at startup; the pipeline never consults the
// environment on its own.
use anyhow::{bail, Result};
use clap::{Args, Parser};
use std::path::PathBuf;
use std::time::Duration;
use zipjudge_common::config::{
    ToolchainConfig, COMPILER_ENV, DEFAULT_COMPILER, DEFAULT_OUTDIR, DEFAULT_SOURCE,
    DEFAULT_TIMEOUT_SECONDS,
};
use zipjudge_common::types::{CompareMode, SourceKind};

#[derive(Debug, Parser)]
#[command(name = "zipjudge")]
#[command(about = "Run a compiled solution against a zip of <ID>_Input/Output_TestCase_<N>.txt fixtures", long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// C++ source file of the program under test
    #[arg(long, default_value = DEFAULT_SOURCE)]
    pub cpp: PathBuf,

    /// Compiler (e.g., g++-14, g++, clang++)
    #[arg(long, env = COMPILER_ENV, default_value = DEFAULT_COMPILER)]
    pub compiler: String,

    /// Comparison mode: exact or tokens
    #[arg(long, default_value = "exact")]
    pub compare: CompareMode,

    /// Per-test timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout: u64,

    /// Directory for reports
    #[arg(long, default_value = DEFAULT_OUTDIR)]
    pub outdir: PathBuf,

    /// Mark cases whose program exits nonzero as RUNTIME_ERROR
    #[arg(long)]
    pub strict_exit: bool,

    /// JSON file overriding the compiler flag sets
    #[arg(long)]
    pub toolchain_config: Option<PathBuf>,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Google Drive link or file ID of the ZIP
    #[arg(long)]
    pub gdrive: Option<String>,

    /// Path to a local ZIP
    #[arg(long)]
    pub zip: Option<PathBuf>,
}

/// Where to get the test-case archive from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    /// Drive share link or bare file id
    Remote(String),
    Local(PathBuf),
}

impl ArchiveSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            ArchiveSource::Remote(_) => SourceKind::Gdrive,
            ArchiveSource::Local(_) => SourceKind::Zip,
        }
    }

    /// The source exactly as the operator gave it
    pub fn reference(&self) -> String {
        match self {
            ArchiveSource::Remote(link) => link.clone(),
            ArchiveSource::Local(path) => path.display().to_string(),
        }
    }
}

/// Per-case execution settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub compare_mode: CompareMode,
    pub timeout: Duration,
    pub strict_exit: bool,
}

#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub source: ArchiveSource,
    pub cpp: PathBuf,
    /// Requested compiler; resolved against PATH at build time
    pub compiler: String,
    pub toolchain: ToolchainConfig,
    pub run: RunSettings,
    pub outdir: PathBuf,
}

impl HarnessConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let source = match (args.source.gdrive, args.source.zip) {
            (Some(link), None) => ArchiveSource::Remote(link),
            (None, Some(path)) => ArchiveSource::Local(path),
            _ => bail!("Exactly one of --gdrive or --zip must be given"),
        };

        if args.timeout == 0 {
            bail!("--timeout must be at least 1 second");
        }

        let toolchain = ToolchainConfig::load_or_default(args.toolchain_config.as_deref())?;

        Ok(Self {
            source,
            cpp: args.cpp,
            compiler: args.compiler,
            toolchain,
            run: RunSettings {
                compare_mode: args.compare,
                timeout: Duration::from_secs(args.timeout),
                strict_exit: args.strict_exit,
            },
            outdir: args.outdir,
        })
    }
}
