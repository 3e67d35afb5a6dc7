//! inodefs CLI - interactive shell over an emulated inode filesystem.
//!
//! Usage:
//!   inodefs <ROOT>
//!
//! Examples:
//!   inodefs ./fsdir                  # Mount ./fsdir and read commands from stdin
//!   inodefs --format ./fsdir         # Seed an empty filesystem first if needed
//!   inodefs --json ./fsdir           # Print `ls` output as JSON lines
//!
//! Commands: `ls`, `cd <name>`, `mkdir <name>`, `touch <name>`, `exit`.

mod repl;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use inodefs_core::{FileSystem, FsConfig, HostStore, DEFAULT_TABLE_FILE};

use crate::repl::{run_session, Shell};

/// Emulated inode filesystem shell
#[derive(Parser, Debug)]
#[command(name = "inodefs")]
#[command(about = "Browse and extend an emulated inode filesystem")]
struct Args {
    /// Storage root directory holding the inode table and content objects
    #[arg(env = "INODEFS_ROOT")]
    root: PathBuf,

    /// Name of the inode table file inside the storage root
    #[arg(long, default_value = DEFAULT_TABLE_FILE)]
    table_file: String,

    /// Create an empty filesystem if the root has no inode table yet
    #[arg(long)]
    format: bool,

    /// Print directory listings as JSON lines
    #[arg(long)]
    json: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = FsConfig::new(args.root).with_table_file(args.table_file);

    if args.format && !config.table_path().exists() {
        HostStore::format(&config)?;
    }

    let fs = FileSystem::mount(&config)?;
    debug!(root = %config.root().display(), "mounted");

    let stdin = std::io::stdin();
    let mut shell = Shell::new(std::io::stdout(), std::io::stderr());
    shell.json = args.json;
    run_session(fs, &mut shell, stdin.lock())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
