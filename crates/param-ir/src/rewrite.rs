// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Record-by-record rewriting of a [`Document`].
//!
//! [`substitute`] is the generic pass: every layer matching a predicate is
//! replaced by the output of a rewrite function. The input document is left
//! untouched and a new one is returned.
//!
//! Rewrites must be attribute-only. A replacement that changes the number of
//! topology fields would change the graph structure and invalidate the paired
//! `.bin` weights, so it is rejected: the original record is kept and a
//! warning is logged.
//!
//! # Policies
//!
//! | Policy | Swish becomes | Name | Attributes |
//! |---|---|---|---|
//! | [`ToHardSwish`] | `HardSwish` | `silu_` → `hardswish_` | `0=0.166667 1=0.5` |
//! | [`ToReLU`] | `ReLU` | `silu_` → `relu_` | cleared |

use crate::document::Entry;
use crate::{Document, LayerRecord, LayerType, ParamError};

/// HardSwish slope, `1/6`, as ncnn writes it.
pub const HARDSWISH_ALPHA: f32 = 0.166667;

/// HardSwish offset.
pub const HARDSWISH_BETA: f32 = 0.5;

/// Name fragment that exported SiLU layers carry.
const SILU_PREFIX: &str = "silu_";

/// Result of a substitution pass.
#[derive(Debug, Clone)]
pub struct Substitution {
    /// The rewritten document.
    pub document: Document,
    /// Number of records replaced.
    pub rewritten: usize,
    /// Number of matching records whose rewrite was rejected as structural.
    pub rejected: usize,
}

/// Replaces every layer matching `predicate` with `rewrite(layer)`.
///
/// Passthrough lines and non-matching layers are copied as they are. Order is
/// preserved.
pub fn substitute<P, F>(document: &Document, predicate: P, rewrite: F) -> Substitution
where
    P: Fn(&LayerRecord) -> bool,
    F: Fn(&LayerRecord) -> LayerRecord,
{
    let mut rewritten = 0;
    let mut rejected = 0;

    let entries = document
        .entries
        .iter()
        .map(|entry| match entry {
            Entry::Layer(layer) if predicate(layer) => {
                let replacement = rewrite(layer);
                if replacement.topology.len() != layer.topology.len() {
                    tracing::warn!(
                        "rejected structural rewrite of '{}': topology fields {} -> {}",
                        layer.name,
                        layer.topology.len(),
                        replacement.topology.len(),
                    );
                    rejected += 1;
                    return entry.clone();
                }
                tracing::debug!("{} -> {}", layer.summary(), replacement.summary());
                rewritten += 1;
                Entry::Layer(replacement)
            }
            other => other.clone(),
        })
        .collect();

    Substitution {
        document: Document {
            header: document.header.clone(),
            entries,
        },
        rewritten,
        rejected,
    }
}

/// A named record rewrite applied to every matching layer.
///
/// Policies are pure functions of a single record, so they can be unit-tested
/// without building a document.
pub trait RewritePolicy: Send + Sync {
    /// Human-readable name of this policy.
    fn name(&self) -> &str;

    /// Whether `layer` should be rewritten.
    fn matches(&self, layer: &LayerRecord) -> bool;

    /// Produces the replacement record.
    fn rewrite(&self, layer: &LayerRecord) -> LayerRecord;

    /// Runs the policy over a whole document.
    fn apply(&self, document: &Document) -> Substitution {
        let result = substitute(document, |l| self.matches(l), |l| self.rewrite(l));
        tracing::info!(
            "{}: rewrote {} layers ({} rejected)",
            self.name(),
            result.rewritten,
            result.rejected,
        );
        result
    }
}

/// Swish → HardSwish (`x * clip(x/6 + 0.5, 0, 1)`). No retraining needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToHardSwish;

impl RewritePolicy for ToHardSwish {
    fn name(&self) -> &str {
        "hardswish"
    }

    fn matches(&self, layer: &LayerRecord) -> bool {
        layer.layer_type == LayerType::Swish
    }

    fn rewrite(&self, layer: &LayerRecord) -> LayerRecord {
        let mut out = layer.clone();
        out.layer_type = LayerType::HardSwish;
        out.name = layer.name.replace(SILU_PREFIX, "hardswish_");
        out.attributes.insert(0, HARDSWISH_ALPHA.into());
        out.attributes.insert(1, HARDSWISH_BETA.into());
        out
    }
}

/// Swish → ReLU. Faster than HardSwish but costs more accuracy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToReLU;

impl RewritePolicy for ToReLU {
    fn name(&self) -> &str {
        "relu"
    }

    fn matches(&self, layer: &LayerRecord) -> bool {
        layer.layer_type == LayerType::Swish
    }

    fn rewrite(&self, layer: &LayerRecord) -> LayerRecord {
        LayerRecord::new(
            LayerType::ReLU,
            layer.name.replace(SILU_PREFIX, "relu_"),
            layer.topology.clone(),
        )
    }
}

/// The activation substitutions available by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationSwap {
    HardSwish,
    Relu,
}

impl ActivationSwap {
    /// Parses a swap name (`"hardswish"`, `"relu"`).
    pub fn from_name(name: &str) -> Result<Self, ParamError> {
        match name.to_lowercase().as_str() {
            "hardswish" | "hard-swish" => Ok(Self::HardSwish),
            "relu" => Ok(Self::Relu),
            other => Err(ParamError::Config(format!(
                "unknown activation swap '{other}'; expected 'hardswish' or 'relu'"
            ))),
        }
    }

    /// Creates the policy for this swap.
    pub fn policy(&self) -> Box<dyn RewritePolicy> {
        match self {
            Self::HardSwish => Box::new(ToHardSwish),
            Self::Relu => Box::new(ToReLU),
        }
    }
}
