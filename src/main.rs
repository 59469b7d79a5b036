//! grid-schema entry point: config loading, logging setup, and command dispatch.

mod cli;

use anyhow::{Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use grid_schema::config::EditorConfig;
use grid_schema::store::DataStore;

use cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // --config takes priority over the built-in layout
    let config = match cli.config.as_deref() {
        Some(path) => EditorConfig::from_toml_file(path)?,
        None => EditorConfig::standard(),
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("invalid configuration ({} problems)", errors.len());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut store = DataStore::new(config);
    cli::run(cli.command, &mut store)
}
