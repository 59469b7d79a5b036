//! Command-line surface: argument definitions and command execution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::{info, warn};

use grid_schema::io::{export_records_csv, export_report_csv, load_json, save_json};
use grid_schema::reporting::print_report;
use grid_schema::schema::ValueType;
use grid_schema::store::{DataStore, DatasetKind, Scope};
use grid_schema::summary::{DemandSummary, GeneratorSummary, NetworkSummary};

#[derive(Parser, Debug)]
#[command(name = "grid-schema")]
#[command(about = "Inspect and normalize the schema of power-system datasets", version)]
pub struct Cli {
    /// TOML configuration file (defaults to the standard layout)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Profile a collection's fields
    Report {
        #[command(flatten)]
        target: Target,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Also write the report as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Backfill every item with every field seen in the collection
    Normalize {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        output: Output,
    },
    /// Add a field to every item lacking it
    AddField {
        #[command(flatten)]
        target: Target,
        #[arg(short, long)]
        name: String,
        /// string, number, boolean, null, or array
        #[arg(short = 't', long = "type", default_value = "string")]
        value_type: ValueType,
        /// Default value text, coerced to the field type
        #[arg(short, long, default_value = "")]
        default: String,
        #[command(flatten)]
        output: Output,
    },
    /// Remove a field from every item
    RemoveField {
        #[command(flatten)]
        target: Target,
        #[arg(short, long)]
        name: String,
        #[command(flatten)]
        output: Output,
    },
    /// Counts and totals for a whole dataset
    Summary {
        /// Dataset JSON file
        #[arg(long)]
        data: PathBuf,
        /// generators, network, or demand
        #[arg(short, long)]
        kind: DatasetKind,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Write a collection's items as CSV
    Export {
        #[command(flatten)]
        target: Target,
        /// CSV file to write
        #[arg(short, long)]
        out: PathBuf,
        /// Only in-service items
        #[arg(long)]
        active_only: bool,
    },
    /// List the non-empty categories of a network dataset
    Categories {
        /// Network dataset JSON file
        #[arg(long)]
        data: PathBuf,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Dataset file and the collection within it.
#[derive(clap::Args, Debug)]
pub struct Target {
    /// Dataset JSON file
    #[arg(long)]
    pub data: PathBuf,
    /// generators:<level>, network:<category>, or demand
    #[arg(short, long)]
    pub scope: Scope,
}

#[derive(clap::Args, Debug)]
pub struct Output {
    /// Write the modified dataset here instead of back to the input file
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Executes one command against a fresh store.
pub fn run(command: Command, store: &mut DataStore) -> Result<()> {
    match command {
        Command::Report {
            target,
            format,
            csv,
        } => {
            open(store, &target)?;
            let scope = &target.scope;
            let report = store.report(scope)?;
            let conflicts = store.type_conflicts(scope)?;
            let policy = store.policy(scope);
            if report.total_items == 0 {
                warn!(%scope, "collection is empty");
            }
            match format {
                OutputFormat::Text => print_report(scope, &report, &policy, &conflicts),
                OutputFormat::Json => {
                    let doc = json!({
                        "scope": scope.to_string(),
                        "report": report,
                        "typeConflicts": conflicts,
                    });
                    println!("{}", serde_json::to_string_pretty(&doc)?);
                }
            }
            if let Some(path) = csv {
                export_report_csv(&report, &policy, &path)?;
                info!(path = %path.display(), "report written");
            }
        }
        Command::Normalize { target, output } => {
            open(store, &target)?;
            let patched = store.normalize(&target.scope)?;
            println!("{patched} missing fields filled in {}", target.scope);
            save(store, &target, &output)?;
        }
        Command::AddField {
            target,
            name,
            value_type,
            default,
            output,
        } => {
            open(store, &target)?;
            let added = store.add_field(&target.scope, &name, value_type, &default)?;
            if added == 0 {
                warn!(scope = %target.scope, field = %name, "no item lacked the field");
            }
            println!("\"{name}\" added to {added} items in {}", target.scope);
            save(store, &target, &output)?;
        }
        Command::RemoveField {
            target,
            name,
            output,
        } => {
            open(store, &target)?;
            let removed = store.remove_field(&target.scope, &name)?;
            println!("\"{name}\" removed from {removed} items in {}", target.scope);
            save(store, &target, &output)?;
        }
        Command::Summary { data, kind, format } => {
            store.load(kind, load_json(&data)?);
            let config = store.config();
            let dataset = store.dataset(kind);
            let summary = match kind {
                DatasetKind::Generators => {
                    let s = GeneratorSummary::from_dataset(dataset, &config.generators)?;
                    (s.to_string(), serde_json::to_value(s)?)
                }
                DatasetKind::Network => {
                    let s = NetworkSummary::from_dataset(dataset, &config.network)?;
                    (s.to_string(), serde_json::to_value(s)?)
                }
                DatasetKind::Demand => {
                    let s = DemandSummary::from_dataset(dataset, &config.demand)?;
                    (s.to_string(), serde_json::to_value(s)?)
                }
            };
            match format {
                OutputFormat::Text => println!("{}", summary.0),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary.1)?),
            }
        }
        Command::Export {
            target,
            out,
            active_only,
        } => {
            open(store, &target)?;
            let scope = &target.scope;
            let mut columns = store.ordered_fields(scope)?;
            let key_field = match scope {
                Scope::Network { .. } => Some(store.config().network.key_field.clone()),
                Scope::Demand => Some(store.config().demand.key_field.clone()),
                Scope::Generators { .. } => None,
            };
            if let Some(key_field) = key_field {
                columns.insert(0, key_field);
            }
            let items = store.items(scope, active_only)?;
            export_records_csv(&items, &columns, &out)?;
            info!(%scope, rows = items.len(), path = %out.display(), "items exported");
            println!("{} items written to {}", items.len(), out.display());
        }
        Command::Categories { data, format } => {
            store.load(DatasetKind::Network, load_json(&data)?);
            let categories = store.categories();
            if categories.is_empty() {
                warn!(path = %data.display(), "no categories found");
            }
            match format {
                OutputFormat::Text => {
                    for name in &categories {
                        println!("{name}");
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&categories)?),
            }
        }
    }
    Ok(())
}

fn open(store: &mut DataStore, target: &Target) -> Result<()> {
    let data = load_json(&target.data)?;
    store.load(target.scope.kind(), data);
    Ok(())
}

fn save(store: &DataStore, target: &Target, output: &Output) -> Result<()> {
    let path: &Path = output.out.as_deref().unwrap_or(&target.data);
    let data = store.require(target.scope.kind())?;
    save_json(path, data).with_context(|| format!("saving {}", target.scope))?;
    info!(path = %path.display(), "dataset written");
    Ok(())
}
