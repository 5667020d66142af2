//! # ripple
//!
//! Async propagation analysis for JavaScript: given one function the
//! user has chosen to make asynchronous, determine every caller that
//! must become `async`/`await` too, and flag the locations where that
//! is syntactically impossible.

use clap::{Parser, Subcommand};
use ripple::commands;

#[derive(Parser)]
#[command(name = "ripple")]
#[command(about = "Async propagation analysis for JavaScript", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze plain JavaScript/TypeScript files directly.
    Standalone(commands::standalone::StandaloneArgs),
    /// Analyze `<script>` blocks extracted from an HTML entry point.
    Html(commands::html::HtmlArgs),
    /// Load a JSON configuration document and dispatch to its driver.
    Configuration(commands::configuration::ConfigurationArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Standalone(args) => commands::standalone::run(args),
        Commands::Html(args) => commands::html::run(args),
        Commands::Configuration(args) => commands::configuration::run(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
