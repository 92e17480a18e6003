// ABOUTME: Entry point for the deckhand CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use deckhand::config::{self, Config};
use deckhand::error::{ConfigurationError, Result};
use deckhand::output::Output;
use deckhand::pipeline::BuildSpec;
use deckhand::synthesize;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(cli.output);

    if let Err(e) = run(cli.command, &mut output) {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

fn current_dir() -> Result<PathBuf> {
    Ok(env::current_dir()?)
}

fn run(command: Commands, output: &mut Output) -> Result<()> {
    match command {
        Commands::Init { application, force } => {
            let cwd = current_dir()?;
            config::init_config(&cwd, application.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Synth { stack, out } => {
            output.start_timer();
            let config = Config::discover(&current_dir()?)?;
            let synthesis = synthesize(&config)?;
            for warning in synthesis.diagnostics.warnings() {
                output.warning(warning);
            }

            let json = match stack {
                Some(name) => {
                    let topology = synthesis.stack(&name).ok_or_else(|| {
                        ConfigurationError::Malformed {
                            field: "stack".to_string(),
                            reason: format!("no stack named {name}"),
                        }
                    })?;
                    serde_json::to_string_pretty(topology)?
                }
                None => synthesis.to_json()?,
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    output.success(&format!("Wrote {}", path.display()));
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Commands::Buildspec => {
            let config = Config::discover(&current_dir()?)?;
            print!("{}", BuildSpec::container_image(&config).to_yaml()?);
            Ok(())
        }
        Commands::Validate => {
            let config = Config::discover(&current_dir()?)?;
            let synthesis = synthesize(&config)?;
            for warning in synthesis.diagnostics.warnings() {
                output.warning(warning);
            }

            let nodes: usize = synthesis.stacks.iter().map(|s| s.nodes().len()).sum();
            let message = format!(
                "{} stacks, {} resources, {} warnings",
                synthesis.stacks.len(),
                nodes,
                synthesis.diagnostics.warnings().len()
            );
            output.success(&message);
            Ok(())
        }
    }
}
