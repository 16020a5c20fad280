//! Palisade CLI - Content-Security-Policy header checker.
//!
//! Commands:
//! - `palisade check` - Parse a header value and report diagnostics
//! - `palisade inspect` - Parse a header value and print the policy structure

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "palisade")]
#[command(about = "Content-Security-Policy header parser and validator")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a header value and report diagnostics
    Check {
        /// The Content-Security-Policy header value
        header: String,

        /// Origin the policy is evaluated against
        #[arg(short, long, default_value = "http://localhost")]
        origin: String,

        /// Parse a comma-separated policy list instead of a single policy
        #[arg(long)]
        multi: bool,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },

    /// Parse a header value and print the policy structure
    Inspect {
        /// The Content-Security-Policy header value
        header: String,

        /// Origin the policy is evaluated against
        #[arg(short, long, default_value = "http://localhost")]
        origin: String,

        /// Parse a comma-separated policy list instead of a single policy
        #[arg(long)]
        multi: bool,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Check {
            header,
            origin,
            multi,
            strict,
        } => commands::check::run(&header, &origin, multi, strict),
        Commands::Inspect {
            header,
            origin,
            multi,
            format,
        } => commands::inspect::run(&header, &origin, multi, &format),
    }
}
