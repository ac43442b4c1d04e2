mod commands;
mod config;
mod diagnostics;
mod document;
mod error;
mod fragment;
mod locator;
mod progress;
mod render;
mod resolver;
mod types;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "olxtree", version, about = "Browse OLX course packages as an interactive tree")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved course tree and type counts as JSON
    Json {
        /// Course directory, .zip, .tar.gz, or .tgz
        path: PathBuf,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
        /// Print progress to stderr
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print an indented outline of the course structure
    Outline {
        /// Course directory, .zip, .tar.gz, or .tgz
        path: PathBuf,
        /// Print progress to stderr
        #[arg(short, long)]
        verbose: bool,
    },
    /// Write a searchable, collapsible HTML view of the course
    Render {
        /// Output file (default: <name>_structure.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Course directory, .zip, .tar.gz, or .tgz
        path: PathBuf,
        /// Print progress to stderr
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Json { path, pretty, verbose } => commands::json(&path, pretty, verbose),
        Commands::Outline { path, verbose } => commands::outline(&path, verbose),
        Commands::Render { output, path, verbose } => {
            commands::render(&path, output.as_deref(), verbose)
        },
    };

    return match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}
