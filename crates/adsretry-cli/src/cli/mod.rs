//! CLI for inspecting and exercising adsretry policies.

mod commands;

use adsretry_core::config::{self, AdsRetryConfig};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_classify, run_config, run_schedule, run_simulate, SimulateOptions};

/// Top-level CLI for adsretry.
#[derive(Debug, Parser)]
#[command(name = "adsretry")]
#[command(about = "adsretry: retry/backoff policy for advertising API calls", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/adsretry/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the backoff delay slept before each retry.
    Schedule {
        /// Also print one jittered sample per retry, drawn from this seed.
        #[arg(long, value_name = "N")]
        seed: Option<u64>,
    },

    /// Show whether an API error would be retried, and which rule matched.
    Classify {
        /// Structured error code reported by the API.
        #[arg(long)]
        code: Option<String>,
        /// Error message reported by the API.
        message: String,
    },

    /// Run the retry loop against a scripted API call.
    Simulate {
        /// Error code the scripted call fails with.
        #[arg(long)]
        code: Option<String>,
        /// Error message the scripted call fails with.
        #[arg(long, default_value = "simulated API failure")]
        message: String,
        /// Number of failures before the call succeeds.
        #[arg(long, default_value = "1000", value_name = "N")]
        failures: u32,
        /// Fail with a non-API error instead (never retried).
        #[arg(long)]
        unexpected: bool,
        /// Seed for jitter, for a reproducible run.
        #[arg(long, value_name = "N")]
        seed: Option<u64>,
        /// Actually sleep between attempts instead of only recording delays.
        #[arg(long)]
        sleep: bool,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the config file path and the effective configuration.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<AdsRetryConfig> {
    match path {
        Some(path) => config::load_from_path(path),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_ref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Schedule { seed } => run_schedule(&cfg, seed)?,
            CliCommand::Classify { code, message } => {
                run_classify(&cfg, code.as_deref(), &message)?
            }
            CliCommand::Simulate {
                code,
                message,
                failures,
                unexpected,
                seed,
                sleep,
                json,
            } => {
                let opts = SimulateOptions {
                    code,
                    message,
                    failures,
                    unexpected,
                    seed,
                    sleep,
                    json,
                };
                run_simulate(&cfg, &opts)?;
            }
            CliCommand::Config => run_config(&cfg, cli.config.as_deref())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
