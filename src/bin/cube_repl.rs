//! Interactive cube dialogue
//!
//! # Usage
//!
//! ```bash
//! # Dialogue over the bundled demo schema
//! cube_repl --schema demos/claims.yaml
//!
//! # Custom configuration, JSON displays
//! cube_repl --schema demos/claims.yaml --config dialogue.yaml --format json
//!
//! # Log solver decisions
//! RUST_LOG=cube_dialogue=debug cube_repl --schema demos/claims.yaml
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use cube_dialogue::{DialogueConfig, DialogueEngine, Display, Event, InMemorySchema, SessionStore};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cube_repl")]
#[command(version = "0.1.0")]
#[command(about = "Build OLAP queries in a natural-language dialogue")]
struct Cli {
    /// Cube schema (YAML)
    #[arg(long, short, env = "CUBE_SCHEMA", default_value = "demos/claims.yaml")]
    schema: PathBuf,

    /// Dialogue configuration (YAML); falls back to CUBE_DIALOGUE_CONFIG
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Display format
    #[arg(long, short = 'o', default_value = "pretty", value_enum)]
    format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DialogueConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => DialogueConfig::from_env()?,
    };
    let schema = InMemorySchema::load(&cli.schema)
        .with_context(|| format!("loading schema {}", cli.schema.display()))?;

    let engine = DialogueEngine::in_memory(schema, config);
    let store = SessionStore::new();
    let session = store.create().await;

    println!("{}", "Cube dialogue".bold().cyan());
    println!("{}", "Type 'exit' to leave.\n".dimmed());
    print_displays(&engine.prompt(&session)?, cli.format)?;

    let mut editor = DefaultEditor::new()?;
    let mut session_id = session.id;

    loop {
        let line = match editor.readline(&"> ".green().to_string()) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        editor.add_history_entry(input)?;

        let Some(current) = store.get(session_id).await else {
            break;
        };
        let turn = match engine.handle_input(&current, input) {
            Ok(turn) => turn,
            Err(err) => {
                eprintln!("{} {err}", "error:".red().bold());
                continue;
            }
        };

        if cli.format == OutputFormat::Pretty {
            println!("{}", format!("[{}]", turn.event).dimmed());
        }
        print_displays(&turn.displays, cli.format)?;

        session_id = turn.session.id;
        let finished = turn.session.is_finished() || turn.event == Event::Exit;
        store.replace(turn.session).await?;
        if finished {
            break;
        }
    }

    store.remove(session_id).await;
    Ok(())
}

fn print_displays(displays: &[Display], format: OutputFormat) -> Result<()> {
    for display in displays {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(display)?),
            OutputFormat::Pretty => match display {
                Display::Error { .. } => print!("{}", display.to_string().red()),
                Display::Message { .. } => print!("{}", display.to_string().yellow()),
                _ => print!("{display}"),
            },
        }
    }
    Ok(())
}
