//! Vitrine CLI - Drive a configurator session from the shell
//!
//! Commands: categories, previews, show, replay
//! Outputs JSON to stdout, logs to stderr
//! Returns non-zero when the catalog cannot be loaded

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vitrine_core::{
    Configurator, Event, FileSource, Phase, RecordingSurface, Render, Viewer, VisualizerConfig,
};

#[derive(Parser)]
#[command(name = "vitrine-cli")]
#[command(about = "Vitrine CLI - Product Configurator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog document, overrides the configured data source
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List categories with product counts
    Categories,

    /// Landing thumbnails for a category
    Previews {
        #[arg(short, long)]
        category: String,
    },

    /// Render a product with the given attribute values
    Show {
        #[arg(short, long)]
        category: String,

        /// Model id, defaults to the first product of the category
        #[arg(short, long)]
        model: Option<String>,

        /// Attribute value as kind=value, repeatable
        #[arg(short, long = "set")]
        set: Vec<String>,
    },

    /// Dispatch a JSON list of events and print every render
    Replay {
        #[arg(short, long)]
        events: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "vitrine_core=debug" } else { "vitrine_core=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => match VisualizerConfig::load_from_file(path) {
            Ok(c) => c,
            Err(e) => {
                return print_json(&serde_json::json!({"success": false, "error": e.to_string()}), ExitCode::FAILURE);
            }
        },
        None => VisualizerConfig::default(),
    };

    let data = cli.data.clone().unwrap_or_else(|| PathBuf::from(&config.data_source));
    let mut configurator = Configurator::new(config);
    let mut surface = RecordingSurface::default();

    let render = configurator.load(&FileSource::new(data));
    Viewer::apply(&render, &mut surface);
    if configurator.phase() == Phase::Failed {
        let output = serde_json::json!({"success": false, "messages": surface.messages});
        return print_json(&output, ExitCode::FAILURE);
    }

    match cli.command {
        Commands::Categories => {
            let Some(catalog) = configurator.catalog() else {
                return ExitCode::FAILURE;
            };
            let categories: Vec<_> = catalog
                .categories()
                .map(|name| serde_json::json!({
                    "name": name,
                    "products": catalog.products_of(name).len(),
                }))
                .collect();
            let output = serde_json::json!({
                "fingerprint": catalog.fingerprint(),
                "categories": categories,
            });
            print_json(&output, ExitCode::SUCCESS)
        }

        Commands::Previews { category } => {
            let render = configurator.landing_search(&category);
            Viewer::apply(&render, &mut surface);
            print_json(&surface.landing, ExitCode::SUCCESS)
        }

        Commands::Show { category, model, set } => {
            let mut events = vec![Event::CategoryChange { category }];
            if let Some(model) = model {
                events.push(Event::ModelChange { model });
            }
            for assignment in &set {
                match assignment.split_once('=') {
                    Some((kind, value)) => events.push(Event::AttributeChange {
                        kind: kind.to_string(),
                        value: value.to_string(),
                    }),
                    None => {
                        let output = serde_json::json!({
                            "success": false,
                            "error": format!("Expected kind=value, got '{}'", assignment),
                        });
                        return print_json(&output, ExitCode::from(2));
                    }
                }
            }
            for event in events {
                match configurator.dispatch(event) {
                    Ok(render) => Viewer::apply(&render, &mut surface),
                    Err(e) => {
                        let output = serde_json::json!({"success": false, "error": e.to_string()});
                        return print_json(&output, ExitCode::from(2));
                    }
                }
            }
            let output = serde_json::json!({
                "success": true,
                "surface": surface,
                "snapshot": configurator.snapshot(),
            });
            print_json(&output, ExitCode::SUCCESS)
        }

        Commands::Replay { events } => {
            let events: Vec<Event> = match fs::read_to_string(&events)
                .map_err(|e| e.to_string())
                .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
            {
                Ok(events) => events,
                Err(e) => {
                    let output = serde_json::json!({"success": false, "error": format!("Invalid events: {}", e)});
                    return print_json(&output, ExitCode::FAILURE);
                }
            };

            let mut renders: Vec<Render> = vec![];
            for event in events {
                match configurator.dispatch(event) {
                    Ok(render) => {
                        Viewer::apply(&render, &mut surface);
                        renders.push(render);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "event rejected");
                        renders.push(Render::Unchanged);
                    }
                }
            }
            let output = serde_json::json!({
                "success": true,
                "renders": renders,
                "surface": surface,
                "diagnostics": configurator.diagnostics(),
            });
            print_json(&output, ExitCode::SUCCESS)
        }
    }
}

fn print_json<T: Serialize>(value: &T, code: ExitCode) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            code
        }
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to serialize output: {}"}}"#, e);
            ExitCode::FAILURE
        }
    }
}
