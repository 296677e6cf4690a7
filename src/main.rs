// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use std::io::{Read, Write};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use freja_content::StreamClassifier;
use freja_model::{ChatBackend, Message, ResponseEvent};
use freja_tui::{App, AppOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = freja_config::load(cli.config.as_deref())?;
    if let Some(model) = &cli.model {
        config.backend.model = model.clone();
    }
    tracing::debug!(
        base_url = %config.backend.base_url,
        model = %config.backend.model,
        "configuration resolved"
    );
    if cli.show_reasoning {
        config.tui.show_reasoning = true;
    }
    if cli.ascii {
        config.tui.ascii = true;
    }

    if let Some(cmd) = &cli.command {
        match cmd {
            Commands::ShowConfig => {
                println!("{}", toml::to_string_pretty(&config)?);
                return Ok(());
            }
            Commands::ListModels { json } => {
                let backend = freja_model::from_config(&config.backend)?;
                return list_models_cmd(backend.as_ref(), *json).await;
            }
        }
    }

    let config = Arc::new(config);
    let backend: Arc<dyn ChatBackend> = Arc::from(freja_model::from_config(&config.backend)?);

    if cli.headless {
        run_headless(cli, config, backend).await
    } else {
        run_tui(cli, config, backend).await
    }
}

async fn list_models_cmd(backend: &dyn ChatBackend, json: bool) -> anyhow::Result<()> {
    let models = backend.list_models().await.context("listing models")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&models)?);
    } else {
        for model in models {
            println!("{model}");
        }
    }
    Ok(())
}

/// One-shot mode: send a single prompt and stream the visible answer to
/// stdout.  Reasoning goes to stderr when requested, so the answer stays
/// pipeable either way.
async fn run_headless(
    cli: Cli,
    config: Arc<freja_config::Config>,
    backend: Arc<dyn ChatBackend>,
) -> anyhow::Result<()> {
    let prompt = match cli.prompt {
        Some(p) => p,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading prompt from stdin")?;
            buf
        }
    };
    let prompt = prompt.trim();
    anyhow::ensure!(!prompt.is_empty(), "no prompt given (argument or stdin)");

    let messages = vec![
        Message::system(&config.chat.system_preamble),
        Message::user(prompt),
    ];

    let mut stream = backend.chat(&messages).await?;
    let mut classifier = StreamClassifier::new();
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();

    while let Some(item) = stream.next().await {
        match item? {
            ResponseEvent::TextDelta(fragment) => {
                let delta = classifier.feed(&fragment);
                write_delta(&stdout, &stderr, &delta, cli.show_reasoning)?;
            }
            ResponseEvent::Done => break,
            ResponseEvent::Error(msg) => anyhow::bail!("backend error: {msg}"),
        }
    }

    let delta = classifier.finalize();
    write_delta(&stdout, &stderr, &delta, cli.show_reasoning)?;

    let mut out = stdout.lock();
    writeln!(out)?;
    Ok(())
}

fn write_delta(
    stdout: &std::io::Stdout,
    stderr: &std::io::Stderr,
    delta: &freja_content::FeedDelta,
    show_reasoning: bool,
) -> anyhow::Result<()> {
    if show_reasoning && !delta.reasoning.is_empty() {
        let mut err = stderr.lock();
        write!(err, "{}", delta.reasoning)?;
        err.flush()?;
    }
    if !delta.visible.is_empty() {
        let mut out = stdout.lock();
        write!(out, "{}", delta.visible)?;
        out.flush()?;
    }
    Ok(())
}

async fn run_tui(
    cli: Cli,
    config: Arc<freja_config::Config>,
    backend: Arc<dyn ChatBackend>,
) -> anyhow::Result<()> {
    let opts = AppOptions {
        initial_prompt: cli.prompt,
        show_reasoning: config.tui.show_reasoning,
        ascii: config.tui.ascii,
    };
    let app = App::new(config, backend, opts);

    let terminal = ratatui::init();
    let result = app.run(terminal).await;
    ratatui::restore();
    result
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
