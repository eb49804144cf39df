//! CLI commands and argument parsing

use crate::types::Method;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// session-http CLI
#[derive(Parser, Debug)]
#[command(name = "session-http")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// API base URL (overrides the settings file)
    #[arg(short, long, global = true)]
    pub base_url: Option<String>,

    /// Token file (overrides the settings file)
    #[arg(short, long, global = true)]
    pub token_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the returned tokens
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "SESSION_HTTP_PASSWORD")]
        password: String,
    },

    /// Forget the stored tokens
    Logout,

    /// Show the stored session
    Status,

    /// Call an API endpoint
    Request {
        /// HTTP method
        method: Method,

        /// Path relative to the base URL
        path: String,

        /// Inline JSON body
        #[arg(short, long)]
        data: Option<String>,

        /// Query parameters (key=value, repeatable)
        #[arg(short, long = "query", value_parser = parse_key_value)]
        query: Vec<(String, String)>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON (one document per line)
    Json,
    /// Indented JSON
    Pretty,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}
