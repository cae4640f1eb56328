// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use duet_config::{Config, ModelKind};

#[derive(Parser, Debug)]
#[command(
    name = "duet",
    about = "Write alongside a language model: two continuations, you pick one",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Text file to seed the document with (read only, never written back)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Model name sent to the completion service
    #[arg(long, short = 'M', env = "DUET_MODEL")]
    pub model: Option<String>,

    /// Completion service base URL, e.g. "http://localhost:8080/v1/"
    #[arg(long, env = "DUET_BASE_URL")]
    pub base_url: Option<String>,

    /// Request shape: raw completion or chat messages
    #[arg(long, value_enum)]
    pub kind: Option<ModelKind>,

    /// Upper bound on generated tokens per candidate
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// Use the offline mock provider instead of a server
    #[arg(long)]
    pub mock: bool,

    /// Log file (the terminal belongs to the editor)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print the effective configuration and exit
    ShowConfig,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.model.name = model.clone();
        }
        if let Some(url) = &self.base_url {
            config.model.base_url = url.clone();
        }
        if let Some(kind) = self.kind {
            config.model.kind = kind;
        }
        if let Some(n) = self.max_tokens {
            config.model.max_tokens = n;
        }
        if self.mock {
            config.model.provider = "mock".into();
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| std::env::temp_dir().join("duet.log"))
    }
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "duet", &mut std::io::stdout());
}
