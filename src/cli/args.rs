//! Command line argument parsing
//!
//! Subcommands map one-to-one onto the provider operations plus the
//! settings surface:
//! - `check`: analyze and correct a compose file, rendering a diff
//! - `explain`: high-level explanation of a compose file
//! - `keyword`: contextual help for one compose keyword
//! - `fmt`: reformat a compose file, rendering a diff
//! - `probe`: test connectivity to a self-hosted endpoint
//! - `config`: save provider settings
//! - `show-config`: show settings discovery information

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "dca")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AI-assisted Docker Compose editing: correct, explain, and format compose files")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze and correct a compose file, showing suggestions and a diff
    Check {
        /// Path to the docker-compose.yml file
        file: PathBuf,
        /// Write the corrected content back to the file
        #[arg(short = 'w', long = "write")]
        write: bool,
    },
    /// Explain what a compose file does
    Explain {
        /// Path to the docker-compose.yml file
        file: PathBuf,
    },
    /// Get an explanation and example for a compose keyword
    Keyword {
        /// The Docker Compose keyword (e.g. "healthcheck", "depends_on")
        keyword: String,
    },
    /// Reformat a compose file without changing its meaning
    Fmt {
        /// Path to the docker-compose.yml file
        file: PathBuf,
        /// Write the formatted content back to the file
        #[arg(short = 'w', long = "write")]
        write: bool,
    },
    /// Test connectivity to the configured self-hosted endpoint
    Probe,
    /// Save provider settings
    Config {
        /// Provider kind: "gemini" or "openai-compatible"
        #[arg(long = "provider")]
        provider: String,
        /// Model name (e.g. "gemini-2.5-flash", "llama3")
        #[arg(long = "model")]
        model: String,
        /// Base URL for openai-compatible servers (e.g. http://localhost:11434/v1)
        #[arg(long = "base-url")]
        base_url: Option<String>,
        /// API key, where the backend needs one
        #[arg(long = "api-key")]
        api_key: Option<String>,
    },
    /// Show settings discovery information
    ShowConfig,
}
