//! qtoken Command-Line Interface
//!
//! Issue, encode and verify quantum tokens against a measurement backend.
//!
//! ```text
//!   qtoken run                 walk through every stage of a token's life
//!   qtoken verify --wait 2     verify after a delay (TTL demo)
//!   qtoken verify --impostor 3 decode qubit 3 with the wrong angles
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::ProtocolArgs;
use commands::{backends, run, verify, version};

/// qtoken - quantum token issuance and verification
#[derive(Parser)]
#[command(name = "qtoken")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full token life cycle and print every stage
    Run {
        #[command(flatten)]
        protocol: ProtocolArgs,
    },

    /// Issue a token and verify it
    Verify {
        #[command(flatten)]
        protocol: ProtocolArgs,

        /// Seconds to wait before verifying
        #[arg(short, long, default_value = "0")]
        wait: u64,

        /// Decode this qubit with the wrong angles
        #[arg(long)]
        impostor: Option<u32>,
    },

    /// List available backends
    Backends,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config_file = cli.config.as_deref();

    // Execute command
    let result = match cli.command {
        Commands::Run { protocol } => run::execute(config_file, &protocol).await,

        Commands::Verify {
            protocol,
            wait,
            impostor,
        } => verify::execute(config_file, &protocol, wait, impostor).await,

        Commands::Backends => backends::execute(),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
