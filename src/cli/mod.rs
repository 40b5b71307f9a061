//! CLI module for Spendwise
//!
//! # Commands
//!
//! - `serve` - Start the HTTP API
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Write an annotated config, then start the server with it
//! spendwise config init
//! spendwise serve -c spendwise.toml
//!
//! # Generate shell completions
//! spendwise completions bash > ~/.bash_completion.d/spendwise
//! ```

pub mod completions;
pub mod config;
pub mod serve;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Spendwise - expense tracking with AI budget tips
#[derive(Parser, Debug)]
#[command(
    name = "spendwise",
    version,
    about = "Expense tracking service with currency normalization and AI budget tips"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the Spendwise server
    Serve(ServeArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "spendwise.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "SPENDWISE_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "SPENDWISE_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SPENDWISE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Disable the periodic cache sweep
    #[arg(long)]
    pub no_sweep: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "spendwise.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
