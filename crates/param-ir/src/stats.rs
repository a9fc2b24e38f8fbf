// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Aggregate statistics over a parsed layer description.
//!
//! [`ModelStats`] is a pure function of a [`Document`]: same document, same
//! stats, same ranking. The parameter estimate is the sum of convolution
//! `weight_data_size` attributes, so it ignores every non-convolution weight.

use crate::{Document, LayerType};

/// Extracted parameters of one `Convolution` layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ConvDetail {
    pub name: String,
    /// Attribute 0.
    pub out_channels: i64,
    /// Attribute 1.
    pub kernel: i64,
    /// Attribute 6, number of weight elements.
    pub weight_size: i64,
}

/// Number of layers of one operator type.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TypeCount {
    pub layer_type: String,
    pub count: usize,
}

/// Layer counts and convolution weight statistics.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ModelStats {
    /// Layer records excluding `Input` layers.
    pub total_layers: usize,
    pub input_layers: usize,
    pub conv_layers: usize,
    pub swish_layers: usize,
    pub pooling_layers: usize,
    pub concat_layers: usize,
    /// Sum of convolution weight sizes, saturating at `i64::MAX`.
    pub total_params_estimate: i64,
    /// Every operator type seen, in order of first appearance.
    pub type_histogram: Vec<TypeCount>,
    /// One entry per `Convolution`, in declaration order.
    pub conv_details: Vec<ConvDetail>,
}

impl ModelStats {
    /// Analyzes a document.
    pub fn from_document(document: &Document) -> Self {
        let mut stats = Self {
            total_layers: 0,
            input_layers: 0,
            conv_layers: 0,
            swish_layers: 0,
            pooling_layers: 0,
            concat_layers: 0,
            total_params_estimate: 0,
            type_histogram: Vec::new(),
            conv_details: Vec::new(),
        };

        for layer in document.layers() {
            stats.bump_histogram(layer.layer_type.as_str());

            match layer.layer_type {
                LayerType::Input => {
                    stats.input_layers += 1;
                    continue;
                }
                LayerType::Convolution => {
                    stats.conv_layers += 1;
                    if let Some(params) = layer.conv_params() {
                        stats.total_params_estimate =
                            stats.total_params_estimate.saturating_add(params.weight_size);
                        stats.conv_details.push(ConvDetail {
                            name: layer.name.clone(),
                            out_channels: params.out_channels,
                            kernel: params.kernel,
                            weight_size: params.weight_size,
                        });
                    }
                }
                LayerType::Swish => stats.swish_layers += 1,
                LayerType::Pooling => stats.pooling_layers += 1,
                LayerType::Concat => stats.concat_layers += 1,
                _ => {}
            }
            stats.total_layers += 1;
        }

        stats
    }

    fn bump_histogram(&mut self, layer_type: &str) {
        match self
            .type_histogram
            .iter_mut()
            .find(|t| t.layer_type == layer_type)
        {
            Some(entry) => entry.count += 1,
            None => self.type_histogram.push(TypeCount {
                layer_type: layer_type.to_string(),
                count: 1,
            }),
        }
    }

    /// The `k` heaviest convolutions by weight size, descending. Ties keep
    /// declaration order.
    pub fn top_convolutions(&self, k: usize) -> Vec<&ConvDetail> {
        let mut ranked: Vec<&ConvDetail> = self.conv_details.iter().collect();
        ranked.sort_by(|a, b| b.weight_size.cmp(&a.weight_size));
        ranked.truncate(k);
        ranked
    }

    /// Parameter estimate in millions.
    pub fn params_millions(&self) -> f64 {
        self.total_params_estimate as f64 / 1e6
    }

    /// Returns a one-line summary string.
    pub fn summary(&self) -> String {
        format!(
            "{} layers ({} conv, {} swish, {} pooling, {} concat), ~{:.2}M params",
            self.total_layers,
            self.conv_layers,
            self.swish_layers,
            self.pooling_layers,
            self.concat_layers,
            self.params_millions(),
        )
    }
}

/// Analyzes a document. Shorthand for [`ModelStats::from_document`].
pub fn analyze(document: &Document) -> ModelStats {
    ModelStats::from_document(document)
}
