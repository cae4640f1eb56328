// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use std::fs::OpenOptions;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use duet_tui::{App, AppOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle subcommands first; they print to stdout and never start the TUI.
    if let Some(cmd) = &cli.command {
        match cmd {
            Commands::Completions { shell } => {
                cli::print_completions(*shell);
                return Ok(());
            }
            Commands::ShowConfig => {
                let mut config = duet_config::load(cli.config.as_deref())?;
                cli.apply_overrides(&mut config);
                print!("{}", duet_config::to_toml_string(&config)?);
                return Ok(());
            }
        }
    }

    init_logging(cli.verbose, &cli.log_path())?;

    let mut config = duet_config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let initial_text = match &cli.file {
        Some(path) => Some(
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        ),
        None => None,
    };
    let provider = duet_model::from_config(&config.model)?;

    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        anyhow::bail!("duet needs an interactive terminal");
    }
    run_tui(Arc::new(config), provider, AppOptions { initial_text }).await
}

async fn run_tui(
    config: Arc<duet_config::Config>,
    provider: Arc<dyn duet_model::ModelProvider>,
    opts: AppOptions,
) -> anyhow::Result<()> {
    use ratatui::crossterm::{
        event::{
            DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
            PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
        },
        execute,
    };

    let terminal = ratatui::init();
    let _ = execute!(std::io::stdout(), EnableBracketedPaste);
    // Needed to tell Ctrl+Enter apart from Enter.
    let _ = execute!(
        std::io::stdout(),
        PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                | KeyboardEnhancementFlags::REPORT_ALTERNATE_KEYS
        )
    );

    let app = App::new(config, provider, opts);
    let result = app.run(terminal).await;

    let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    let _ = execute!(std::io::stdout(), DisableBracketedPaste);
    ratatui::restore();

    result
}

/// Send logs to a file: the editor owns the terminal.
fn init_logging(verbosity: u8, path: &Path) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(false).with_writer(Mutex::new(file)))
        .with(filter)
        .init();
    Ok(())
}
