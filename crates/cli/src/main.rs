//! reflgen CLI — generate reflection metadata for one translation unit.
//!
//! Calls `reflgen-core` directly; this binary only parses arguments, sets up
//! logging, and reports failures.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use reflgen_core::{find_config_for, generate_file, load_reflgen_config, GenConfig};

/// reflgen — emit C++ reflection registration and serialization for `[[refl]]` classes.
#[derive(Parser)]
#[command(name = "reflgen", version, about)]
struct Cli {
    /// Class to generate metadata for (also exported as __AKR_PLUGIN_NAME__)
    target: String,

    /// Translation unit to scan
    input: PathBuf,

    /// Generated file to write (parent directories are created)
    output: PathBuf,

    /// Generator config file (default: .reflgen.toml next to INPUT, if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also print the discovered class metadata as JSON to stdout
    #[arg(long)]
    json: bool,
}

fn resolve_config(explicit: Option<&Path>, input: &Path) -> GenConfig {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match find_config_for(input) {
            Some(p) => p,
            None => {
                debug!("No config file found, using defaults");
                return GenConfig::default();
            }
        },
    };
    load_reflgen_config(&path).unwrap_or_else(|e| {
        error!(error = %e, "Could not load config");
        std::process::exit(1);
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reflgen=info".parse().unwrap()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_deref(), &cli.input);

    let generated = match generate_file(&cli.target, &cli.input, &cli.output, &config) {
        Ok(g) => g,
        Err(e) => {
            error!(error = %e, input = %cli.input.display(), "Generation failed");
            std::process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&generated.registry) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!(error = %e, "Could not serialize class metadata");
                std::process::exit(1);
            }
        }
    }
}
