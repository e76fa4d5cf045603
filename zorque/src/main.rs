//! Zorque, a text adventure played by tapping one of four screen corners.
//!
//! The terminal stands in for the touchscreen: a left click (or drag) in a
//! quadrant is a tap on that choice. Narration comes from an OpenAI chat
//! model, or from canned replies with `--offline`.
//!
//! # Headless Mode
//!
//! Run with `--headless` to play over stdin/stdout, one choice per line:
//!
//! ```bash
//! cargo run -p zorque -- --headless --offline
//! ```

mod headless;
mod tui;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::info;
use zorque_core::openai::{self, OpenAi, API_KEY_VAR};
use zorque_core::prompts::custom_prompt;
use zorque_core::{CompletionClient, GameConfig, OnlineCompleter};

/// Exit status after the operator interrupts the game.
pub(crate) const EXIT_INTERRUPTED: u8 = 130;

/// Zorque - tap-driven text adventure with an AI game master
#[derive(Parser, Debug)]
#[command(
    name = "zorque",
    version,
    about = "Tap-driven text adventure with an AI game master",
    after_help = "Tap (left click) a corner to choose 1-4. Press q, Esc or Ctrl-C to quit."
)]
struct Cli {
    /// Use canned replies instead of calling the API
    #[arg(long)]
    offline: bool,

    /// Play over stdin/stdout instead of the terminal UI
    #[arg(long)]
    headless: bool,

    /// Chat model asked for narration
    #[arg(long, default_value = zorque_core::config::DEFAULT_MODEL)]
    model: String,

    /// Chat completions endpoint base URL
    #[arg(long)]
    base_url: Option<String>,

    /// File whose contents replace the built-in game master prompt
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Turns kept in the conversation window, system prompt included
    #[arg(long, default_value_t = zorque_core::window::DEFAULT_WINDOW_CAP)]
    window_cap: usize,

    /// Pressed samples needed before a tap counts
    #[arg(long, default_value_t = zorque_core::touch::DEFAULT_DEBOUNCE)]
    debounce: u32,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Wrap width for headless output
    #[arg(long, default_value_t = 60)]
    width: usize,

    /// Log file for the terminal UI (headless mode logs to stderr)
    #[arg(long, default_value = "zorque.log")]
    log_file: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_INTERRUPTED),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    setup_logging(&cli).context("Failed to setup logging")?;

    let config = build_config(&cli)?;
    // Fails on a missing key before the terminal is touched.
    let completer = build_completer(&cli, &config)?;

    if cli.headless {
        headless::run(config, completer, cli.width)
    } else {
        tui::run(config, completer)
    }
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    if cli.headless {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        // The terminal belongs to the game; logs go to a file.
        let log_file = fs::File::create(&cli.log_file).with_context(|| {
            format!("Failed to create log file {}", cli.log_file.display())
        })?;
        tracing_subscriber::fmt()
            .with_writer(Mutex::new(log_file))
            .with_ansi(false)
            .with_env_filter(filter)
            .init();
    }

    info!("Logging initialized (verbose: {})", cli.verbose);
    Ok(())
}

fn build_config(cli: &Cli) -> Result<GameConfig> {
    let mut config = GameConfig::new()
        .with_model(&cli.model)
        .with_window_cap(cli.window_cap)
        .with_debounce(cli.debounce)
        .offline(cli.offline);

    if let Some(temperature) = cli.temperature {
        config = config.with_temperature(temperature);
    }

    if let Some(path) = &cli.prompt_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?;
        let prompt = custom_prompt(&text)
            .with_context(|| format!("Prompt file {} is empty", path.display()))?;
        config = config.with_system_prompt(prompt);
    }

    Ok(config)
}

fn build_completer(cli: &Cli, config: &GameConfig) -> Result<CompletionClient> {
    if config.offline {
        info!("Offline mode: replies are canned");
        return Ok(CompletionClient::offline());
    }

    let client = match OpenAi::from_env() {
        Ok(client) => client,
        Err(openai::Error::NoApiKey) => bail!(
            "{API_KEY_VAR} environment variable not set.\n\
             Set it in a .env file, export {API_KEY_VAR}=your_key_here, \
             or run with --offline."
        ),
        Err(err) => return Err(err.into()),
    };

    let mut client = client.with_model(&config.model);
    if let Some(base_url) = &cli.base_url {
        client = client.with_base_url(base_url);
    }

    let mut completer = OnlineCompleter::new(client);
    if let Some(temperature) = config.temperature {
        completer = completer.with_temperature(temperature);
    }
    if let Some(max_tokens) = config.max_tokens {
        completer = completer.with_max_tokens(max_tokens);
    }

    info!(model = %config.model, "Online mode");
    Ok(CompletionClient::online(completer))
}
