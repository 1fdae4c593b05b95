//! # CLI Interface
//!
//! Command-line argument structure for `cardvault-server` using `clap`
//! derive. Two subcommands: `run` and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CardVault tokenization server.
///
/// Serves the tokenization and redemption HTTP API backed by an embedded
/// store, and exposes Prometheus metrics on a separate port.
#[derive(Parser, Debug)]
#[command(
    name = "cardvault-server",
    about = "CardVault tokenization server",
    version,
    propagate_version = true
)]
pub struct CardVaultCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the tokenization server.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the data directory where the card and token store lives.
    ///
    /// Created on first run if it does not exist.
    #[arg(long, short = 'd', env = "CARDVAULT_DATA_DIR", default_value = "~/.cardvault")]
    pub data_dir: PathBuf,

    /// Port for the HTTP API.
    #[arg(long, env = "CARDVAULT_API_PORT", default_value_t = cardvault::config::DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "CARDVAULT_METRICS_PORT", default_value_t = cardvault::config::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Token validity window in seconds.
    #[arg(
        long,
        env = "CARDVAULT_TOKEN_TTL_SECS",
        default_value_t = cardvault::config::DEFAULT_TOKEN_TTL.as_secs()
    )]
    pub token_ttl_secs: u64,

    /// Static API key required in the `x-api-key` header of every request.
    ///
    /// When omitted, authentication is disabled. **Never pass this flag on
    /// the command line in production** — use the environment variable.
    #[arg(long, env = "CARDVAULT_API_KEY")]
    pub api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        CardVaultCli::command().debug_assert();
    }

    #[test]
    fn run_defaults_come_from_vault_config() {
        let cli = CardVaultCli::parse_from(["cardvault-server", "run"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.api_port, cardvault::config::DEFAULT_API_PORT);
                assert_eq!(
                    args.token_ttl_secs,
                    cardvault::config::DEFAULT_TOKEN_TTL.as_secs()
                );
            }
            _ => panic!("expected run subcommand"),
        }
    }
}
