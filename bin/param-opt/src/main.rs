// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # param-opt
//!
//! Command-line optimizer for ncnn layer-description (`.param`) files.
//!
//! ## Usage
//! ```bash
//! # Analyze only
//! param-opt -i yolov8n_640.param
//!
//! # Swap SiLU for HardSwish (same .bin file keeps working)
//! param-opt -i yolov8n_640.param -m hardswish
//!
//! # Swap SiLU for ReLU, explicit output path
//! param-opt -i yolov8n_640.param -o yolov8n_640_relu.param -m relu
//!
//! # Channel pruning guidance (writes nothing)
//! param-opt -i yolov8n_640.param -m channels --ratio 0.75
//! ```

mod commands;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use param_ir::{ActivationSwap, BadAttributePolicy, OptimizerConfig, ParamLoader};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "param-opt",
    about = "Analyze and optimize ncnn .param layer descriptions",
    version,
    author
)]
struct Cli {
    /// Input .param file.
    #[arg(short, long)]
    input: PathBuf,

    /// Output .param file (default: <input stem>_opt.<ext>).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Optimization mode. Analysis always runs first.
    #[arg(short, long, value_enum, default_value_t = Mode::Analyze)]
    mode: Mode,

    /// Channel keep ratio, only used by `channels` mode.
    #[arg(long)]
    ratio: Option<f64>,

    /// Number of heaviest convolutions to list.
    #[arg(long)]
    top: Option<usize>,

    /// Print the analysis as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Keep malformed layer lines verbatim instead of failing.
    #[arg(long)]
    skip_bad_lines: bool,

    /// Path to a TOML configuration file (CLI flags take precedence).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Print statistics only.
    Analyze,
    /// Replace Swish with HardSwish.
    Hardswish,
    /// Replace Swish with ReLU.
    Relu,
    /// Print structured-pruning guidance; no file is written.
    Channels,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let config = resolve_config(&cli)?;
    let console = commands::Console::new(cli.json);

    let document = ParamLoader::load(&cli.input, config.parse_options())
        .with_context(|| format!("failed to load '{}'", cli.input.display()))?;
    tracing::info!("loaded '{}': {}", cli.input.display(), document.summary());
    if let Some((declared, actual)) = document.header_mismatch() {
        tracing::warn!("header declares {declared} layers but {actual} were parsed");
    }

    let stats = commands::analyze::execute(&console, &cli.input, &document, config.top_k)?;

    match cli.mode {
        Mode::Analyze => {
            console.line("");
            console.line("✅ Analysis only. Use --mode hardswish or --mode relu to optimize.");
            Ok(())
        }
        Mode::Hardswish | Mode::Relu => {
            let swap = match cli.mode {
                Mode::Hardswish => ActivationSwap::HardSwish,
                _ => ActivationSwap::Relu,
            };
            let output = cli
                .output
                .clone()
                .unwrap_or_else(|| config.output_path_for(&cli.input));
            commands::optimize::execute(&console, &document, swap, &cli.input, &output)
        }
        Mode::Channels => {
            commands::channels::execute(&console, &stats, config.channel_ratio, config.top_k);
            Ok(())
        }
    }
}

/// Merges the optional TOML config with CLI overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<OptimizerConfig> {
    let mut config = match &cli.config {
        Some(path) => OptimizerConfig::from_file(path)?,
        None => OptimizerConfig::default(),
    };
    if let Some(top) = cli.top {
        config.top_k = top;
    }
    if let Some(ratio) = cli.ratio {
        config.channel_ratio = ratio;
    }
    if cli.skip_bad_lines {
        config.on_bad_attribute = BadAttributePolicy::Skip;
    }
    config.validate()?;
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}
