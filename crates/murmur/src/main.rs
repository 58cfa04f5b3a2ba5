// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! murmur - an always-on AI agent runtime.
//!
//! Binary entry point: `serve` runs the full runtime, `status` queries a
//! running instance's gateway.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use murmur_config::MurmurConfig;

mod serve;
mod status;

/// murmur - an always-on AI agent runtime.
#[derive(Parser, Debug)]
#[command(name = "murmur", version, about, long_about = None)]
struct Cli {
    /// Path to a murmur.toml config file (defaults to the XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the murmur agent runtime.
    Serve,
    /// Query a running instance's /api/status endpoint.
    Status,
}

fn load_config(path: Option<&PathBuf>) -> Result<MurmurConfig, impl std::fmt::Display> {
    match path {
        Some(path) => murmur_config::load_config_from_path(path),
        None => murmur_config::load_config(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("murmur: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Status => status::run_status(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("murmur: {e}");
            ExitCode::FAILURE
        }
    }
}
