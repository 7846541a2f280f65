//! Sapvault command-line binary.
//!
//! # Usage
//!
//! ```bash
//! # Create a rotation with default parameters (dimension 1536, s = 1, β = 5)
//! sapvault --store vault.redb rotate
//!
//! # Create a small rotation for experiments
//! sapvault --store vault.redb rotate --dimension 4 --approximation-factor 0
//!
//! # Encrypt a vector (JSON array or comma-separated values)
//! sapvault --store vault.redb encrypt --vector '[0.1, 0.2, 0.3, 0.4]'
//! ```
//!
//! Responses are written to stdout as JSON; logs go to stderr.

use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use sapvault_core::RedbConfigStore;
use sapvault_crypto::OsEntropy;
use sapvault_server::{Backend, EncryptRequest, RotateRequest, VectorInput};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Distance-preserving vector encryption
#[derive(Parser, Debug)]
#[command(name = "sapvault")]
#[command(about = "Scale-And-Perturb vector encryption")]
#[command(version)]
struct Args {
    /// Path to the configuration database
    #[arg(long, global = true, default_value = "sapvault.redb")]
    store: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new secret rotation, replacing the current one
    Rotate {
        /// Vector dimension
        #[arg(long, allow_hyphen_values = true)]
        dimension: Option<i64>,

        /// Scaling factor s
        #[arg(long, allow_hyphen_values = true)]
        scaling_factor: Option<f64>,

        /// Approximation factor β
        #[arg(long, allow_hyphen_values = true)]
        approximation_factor: Option<f64>,
    },

    /// Encrypt one vector under the current rotation
    Encrypt {
        /// Vector as a JSON array or comma-separated numbers
        #[arg(long, allow_hyphen_values = true)]
        vector: String,

        /// Caller identity recorded in the audit log
        #[arg(long, default_value = "cli")]
        caller: String,
    },

    /// Report whether a rotation has been configured
    Status,
}

#[derive(Serialize)]
struct StatusResponse {
    configured: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        },
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let store = RedbConfigStore::open(&args.store)?;
    let backend = Backend::new(store, OsEntropy);

    match args.command {
        Command::Rotate { dimension, scaling_factor, approximation_factor } => {
            let request = RotateRequest { dimension, scaling_factor, approximation_factor };
            write_json(&backend.rotate(&request)?)
        },
        Command::Encrypt { vector, caller } => {
            let request = EncryptRequest { vector: Some(VectorInput::from_arg(&vector)) };
            write_json(&backend.encrypt(&request, &caller)?)
        },
        Command::Status => write_json(&StatusResponse { configured: backend.config_exists()? }),
    }
}

fn write_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = io::stdout().lock();
    serde_json::to_writer(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
