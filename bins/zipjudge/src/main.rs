mod acquire;
mod config;
mod discovery;
mod engine;
mod error;
mod evaluator;
mod executor;
mod report;

#[cfg(test)]
mod pipeline_tests;

use clap::Parser;
use config::{CliArgs, HarnessConfig};
use tracing::{error, info};

/// LOG_FORMAT=json switches the subscriber to JSON lines
const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr; stdout carries the operator-facing progress and summary
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = HarnessConfig::from_args(args)?;

    info!(
        source = %config.source.reference(),
        cpp = %config.cpp.display(),
        compiler = %config.compiler,
        outdir = %config.outdir.display(),
        "zipjudge booting..."
    );

    let manifest = executor::execute_run(&config).await.map_err(|e| {
        error!(error = %e, "Run aborted");
        e
    })?;

    // Case failures are reported, not signalled through the exit status
    println!("{}", report::summary_line(&manifest.results));
    Ok(())
}
