// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use deckhand::output::OutputMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(about = "Declare a containerized web app topology and its build-and-deploy pipeline")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value_t = OutputMode::Normal)]
    pub output: OutputMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new deckhand.yml configuration file
    Init {
        /// Application name used for the application tag
        #[arg(short, long)]
        application: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Synthesize every stack and print the template as JSON
    Synth {
        /// Only emit the named stack
        #[arg(short, long)]
        stack: Option<String>,

        /// Write the template to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the build specification as YAML
    Buildspec,

    /// Synthesize and report diagnostics without emitting a template
    Validate,
}
