// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Forge Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `forge` - supervise, update, and redeploy an application from its
//! repository.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod daemon_process;
mod logging;
mod runner;

#[derive(Parser)]
#[command(name = "forge")]
#[command(version, about = "Continuous-deployment process supervisor")]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Configuration file (default: $FORGE_CFG_FILE, then ./config.json)
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Launch and supervise an application
    Run(commands::run::RunArgs),
    /// Run a safe update in the application's repository
    Update(commands::TargetArgs),
    /// Stop a daemonized application
    Stop(commands::TargetArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_file = cli.config;
    match cli.command {
        Command::Run(args) => commands::run::run(config_file, args).await,
        Command::Update(args) => commands::update::update(config_file, args).await,
        Command::Stop(args) => commands::stop::stop(config_file, args),
    }
}
