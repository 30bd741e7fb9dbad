//! Command-line interface for exercising mthread managed threads.

mod report;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::Level;

use report::{run_current, run_spawn, SpawnOptions};

#[derive(Parser)]
#[command(name = "mthread")]
#[command(author, version, about = "Spawn and inspect named native threads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn named worker threads and report their identities
    Spawn {
        /// Number of workers to spawn
        #[arg(short, long, default_value = "4")]
        count: usize,

        /// Name prefix; workers are named `<prefix>-<index>`
        #[arg(short, long, default_value = "worker")]
        prefix: String,

        /// Drop the handles without joining (workers are detached)
        #[arg(long)]
        detach: bool,

        /// Stack size in bytes for each worker
        #[arg(long)]
        stack_size: Option<usize>,
    },

    /// Report the main thread's per-thread context
    Current,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::TRACE } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_thread_ids(true)
        .with_thread_names(true)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Spawn {
            count,
            prefix,
            detach,
            stack_size,
        } => run_spawn(&SpawnOptions {
            count,
            prefix,
            detach,
            stack_size,
        }),
        Commands::Current => run_current(),
    };

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
