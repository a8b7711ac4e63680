//! manga-creator - turn a manga idea into a generated image from the terminal.
//!
//! Type a prompt, press Enter, and the prompt is POSTed to a generation
//! endpoint. The image reference it returns is shown under the prompt.

mod client;
mod config;
mod error;
mod protocol;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{HttpGenerator, ImageGenerator};
use config::Config;
use std::process::Command as ProcessCommand;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "manga-creator")]
#[command(author, version, about = "Turn a manga idea into a generated image")]
#[command(long_about = "Type a prompt and press Enter to send it to the generation endpoint.\n\nThe endpoint is read from the config file, $MANGA_CREATOR_ENDPOINT or --endpoint.")]
struct Cli {
    /// Prompt to start with (required with --pipe)
    #[arg(value_name = "PROMPT")]
    prompt: Option<String>,

    /// No TUI, just print the image reference (for scripting)
    #[arg(long)]
    pipe: bool,

    /// Override the generation endpoint URL
    #[arg(short = 'e', long, value_name = "URL")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open configuration file in $EDITOR
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config) => handle_config(),
        None => handle_prompt(cli.prompt, cli.pipe, cli.endpoint).await,
    }
}

/// Set up tracing. The TUI owns the terminal, so its logs go to a file.
fn init_logging(to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("manga_creator=info,reqwest=warn"));

    if to_file {
        let path = Config::log_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

/// Handle prompt mode (TUI or pipe).
async fn handle_prompt(prompt: Option<String>, pipe_mode: bool, endpoint: Option<String>) -> Result<()> {
    if !pipe_mode && !atty::is(atty::Stream::Stdout) {
        return Err(anyhow::anyhow!(
            "stdout is not a terminal; use --pipe \"<prompt>\" for scripting"
        ));
    }

    init_logging(!pipe_mode)?;

    let config = Config::load()
        .context("Failed to load configuration")?
        .with_overrides(endpoint, std::env::var(config::ENDPOINT_ENV).ok());
    let generator = HttpGenerator::new(config.endpoint.clone(), config.timeout())
        .context("Failed to create HTTP client")?;
    info!("Using endpoint: {}", generator.endpoint());

    if pipe_mode {
        let prompt = prompt.ok_or_else(|| anyhow::anyhow!("Prompt required in --pipe mode"))?;
        return run_pipe(&generator, &prompt).await;
    }

    client::run_tui(Arc::new(generator), config.ui, prompt).await
}

/// Submit once and print the image reference, if there is one.
///
/// Failures are logged and otherwise ignored, same as in the TUI.
async fn run_pipe(generator: &dyn ImageGenerator, prompt: &str) -> Result<()> {
    match generator.generate(prompt).await {
        Ok(response) => {
            if let Some(url) = response.image_url {
                println!("{}", url);
            }
        }
        Err(e) => warn!("Generation failed: {}", e),
    }
    Ok(())
}

/// Handle the config command.
fn handle_config() -> Result<()> {
    let config_path = Config::config_path()?;

    // Create default config if it doesn't exist
    if !config_path.exists() {
        Config::default().save()?;
        println!("Created default config at {}", config_path.display());
    }

    // Open in editor
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = ProcessCommand::new(&editor)
        .arg(&config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        eprintln!("Editor exited with non-zero status");
    }

    Ok(())
}
