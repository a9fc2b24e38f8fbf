// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `channels` mode: structured-pruning guidance only.
//!
//! Removing channels changes tensor shapes, so the `.bin` weights must be
//! regenerated by retraining the source model and converting it again. This
//! mode never writes a file; it previews the channel counts the heaviest
//! convolutions would end up with and lists the external steps.

use super::Console;
use param_ir::ModelStats;

pub fn execute(console: &Console, stats: &ModelStats, ratio: f64, top_k: usize) {
    console.line("");
    console.line(format!(
        "⚠️  Reducing channels to {:.0}% (pruning {:.0}%) requires:",
        ratio * 100.0,
        (1.0 - ratio) * 100.0,
    ));
    console.line("  1. Pruning the source PyTorch/ONNX model (e.g. L1-magnitude importance)");
    console.line("  2. Fine-tuning it for a few epochs to recover accuracy");
    console.line("  3. Re-exporting and converting it to ncnn (new .param and .bin)");

    let top = stats.top_convolutions(top_k);
    if !top.is_empty() {
        console.line("");
        console.line("  Channel preview for the heaviest convolutions:");
        for conv in top {
            console.line(format!(
                "   {:<30} {:>6} → {:>6}",
                conv.name,
                conv.out_channels,
                pruned_channels(conv.out_channels, ratio),
            ));
        }
    }

    console.line("");
    console.line("⚠️  No file written: channel pruning needs a modified source model.");
}

/// Channels kept at `ratio`, rounded, never below one.
fn pruned_channels(out_channels: i64, ratio: f64) -> i64 {
    if out_channels <= 0 {
        return out_channels;
    }
    ((out_channels as f64 * ratio).round() as i64).max(1)
}
