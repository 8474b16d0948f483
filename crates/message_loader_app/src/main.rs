//! Command-line front end for the random message loader.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use loader_logging::LogDestination;
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "random-message-loader")]
#[command(about = "Fill marked HTML elements with random lines from remote message files")]
#[command(version)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load random messages into a page
    Load {
        /// HTML page to process
        input: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Run the randomness demonstration on a page and render its analysis
    Demo {
        /// Demonstration page carrying `srml.*` meta options
        page: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Base URL that relative message sources resolve against
    #[arg(long)]
    base_url: Option<String>,

    /// Loader configuration file (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for reproducible message selection
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let destination = match cli.log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    loader_logging::initialize(destination, level);

    // Pages are not `Send`, so everything runs on the calling thread.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Command::Load { input, run } => commands::load(&input, &run).await,
            Command::Demo { page, run } => commands::demo(&page, &run).await,
        }
    })
}
