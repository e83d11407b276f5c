mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "zipjudge-cli")]
#[command(about = "zipjudge CLI - Scaffold and pack test-case bundles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create empty placeholder input/output files in <ID>_TestCases/
    Scaffold {
        /// Task ID (e.g., 1942G); prompted for when omitted
        #[arg(short, long)]
        task_id: Option<String>,

        /// Number of cases to create
        #[arg(short, long, default_value = "10")]
        count: u32,

        /// Directory to create the folder in
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },

    /// Zip an existing <ID>_TestCases/ folder into <ID>_TestCases.zip
    Pack {
        /// Task ID (e.g., 1942G); prompted for when omitted
        #[arg(short, long)]
        task_id: Option<String>,

        /// Directory holding the folder
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scaffold {
            task_id,
            count,
            path,
        } => {
            let task_id = commands::task_id_or_prompt(task_id)?;
            commands::scaffold(&path, &task_id, count)?;
        }
        Commands::Pack { task_id, path } => {
            let task_id = commands::task_id_or_prompt(task_id)?;
            commands::pack(&path, &task_id)?;
        }
    }

    Ok(())
}
