// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Analysis report, printed before every mode.
//!
//! Shows layer counts, the convolution parameter estimate and the heaviest
//! convolutions, or the same data as JSON with `--json`.

use super::{group_thousands, truncate, Console};
use param_ir::{analyze, paired_weights_path, Document, ModelStats};
use std::path::Path;

pub fn execute(
    console: &Console,
    input: &Path,
    document: &Document,
    top_k: usize,
) -> anyhow::Result<ModelStats> {
    let stats = analyze(document);
    tracing::info!("{}", stats.summary());

    if console.is_json() {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(stats);
    }

    console.line("╔══════════════════════════════════════════════════════╗");
    console.line("║             param-opt · Model Analysis               ║");
    console.line("╚══════════════════════════════════════════════════════╝");
    console.line("");

    // ── Summary ────────────────────────────────────────────────
    console.line(format!("  File:               {}", input.display()));
    let weights = paired_weights_path(input);
    console.line(format!(
        "  Weights:            {} ({})",
        weights.display(),
        if weights.exists() { "found" } else { "missing" },
    ));
    console.line(format!("  Total layers:       {}", stats.total_layers));
    console.line(format!("  Convolution:        {}", stats.conv_layers));
    console.line(format!("  Swish (SiLU):       {}", stats.swish_layers));
    console.line(format!("  Pooling:            {}", stats.pooling_layers));
    console.line(format!("  Concat:             {}", stats.concat_layers));
    console.line(format!(
        "  Params (estimate):  {} (~{:.2}M)",
        group_thousands(stats.total_params_estimate),
        stats.params_millions(),
    ));
    console.line("");

    // ── Heaviest convolutions ──────────────────────────────────
    let top = stats.top_convolutions(top_k);
    if top.is_empty() {
        console.line("  No convolution layers.");
        return Ok(stats);
    }

    console.line(format!("  Top-{} heaviest convolutions:", top.len()));
    console.line(format!(
        "  {:<4} {:<30} {:>8} {:>6} {:>14}",
        "#", "Name", "Out ch", "k", "Weights",
    ));
    console.line(format!("  {}", "-".repeat(66)));
    for (i, conv) in top.iter().enumerate() {
        console.line(format!(
            "  {:<4} {:<30} {:>8} {:>6} {:>14}",
            i + 1,
            truncate(&conv.name, 30),
            conv.out_channels,
            conv.kernel,
            group_thousands(conv.weight_size),
        ));
    }

    Ok(stats)
}
