// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "freja",
    about = "A local chat TUI for reasoning models with math and markup rendering",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional initial prompt; in headless mode it is required unless
    /// piped on stdin
    #[arg(value_name = "PROMPT")]
    pub prompt: Option<String>,

    /// Run headless (no TUI); streams the answer to stdout
    #[arg(long, short = 'H')]
    pub headless: bool,

    /// Model to use, e.g. "deepseek-r1:latest" or "llama3.2"
    #[arg(long, short = 'M', env = "FREJA_MODEL")]
    pub model: Option<String>,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Show reasoning sections expanded (TUI) or on stderr (headless)
    #[arg(long)]
    pub show_reasoning: bool,

    /// Use plain ASCII instead of Unicode glyphs for UI decoration
    #[arg(long)]
    pub ascii: bool,

    /// Increase log verbosity (-v: debug, -vv: trace); logs go to stderr
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List model identifiers available from the backend
    ListModels {
        /// Emit the list as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration after merging all config files
    ShowConfig,
}
