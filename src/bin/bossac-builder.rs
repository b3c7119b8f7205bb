use anyhow::Result;
use clap::{Parser, Subcommand};

use bossac_builder::config::BuilderConfig;
use bossac_builder::task;

const TASKS_HELP: &str = "Tasks:
  clear
  get-wx, get-bossa, get-ndk
  patch-bossa, remove-bossa
  patch-android, build-android, test-android, install-android
  patch-macos, build-macos, test-macos, install-macos, run-macos";

#[derive(Parser)]
#[command(
    name = "bossac-builder",
    version,
    about = "Build libbossac for Android and macOS targets",
    after_help = TASKS_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Execute a named build task
    Run {
        /// Task name, e.g. `get-bossa` or `build-android`
        task: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = BuilderConfig::load()?;

    match cli.command {
        CliCommand::Run { task } => {
            task::dispatch(&config, &task)?;
            println!("[done] task '{task}' complete");
        }
    }

    Ok(())
}
