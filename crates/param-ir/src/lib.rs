// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # param-ir
//!
//! A small intermediate representation for ncnn layer-description (`.param`)
//! files, with the passes needed to optimize an exported detector without
//! touching its weights:
//!
//! - [`LayerRecord`] / [`LayerType`]: one operator line, with a closed set of
//!   known operator tags and a verbatim fallback for unknown ones.
//! - [`Document`]: header plus ordered entries, serializable back to text.
//! - [`ParamLoader`]: parsing from disk or memory, with an explicit
//!   [`BadAttributePolicy`].
//! - [`substitute`] and the [`RewritePolicy`] implementations
//!   ([`ToHardSwish`], [`ToReLU`]): attribute-only activation swaps.
//! - [`ModelStats`]: layer counts and convolution weight statistics.
//! - [`OptimizerConfig`]: the TOML configuration.
//!
//! # Weight file contract
//! Every `.param` file has a paired `.bin` holding the weights. The rewrites
//! here only change operator tags, names and attributes, so the `.bin` file
//! stays valid. Structural changes (channel pruning) need the weights to be
//! regenerated by an external training pipeline and are out of scope.
//!
//! # Example
//! ```
//! use param_ir::{analyze, Document, RewritePolicy, ToHardSwish};
//!
//! let text = "7767517\n2 2\nInput in 0 1 in\nSwish silu_0 1 1 in out\n";
//! let doc = Document::parse(text).unwrap();
//! let result = ToHardSwish.apply(&doc);
//! assert_eq!(result.rewritten, 1);
//! assert!(result.document.serialize().contains("HardSwish hardswish_0 1 1 in out 0=0.166667 1=0.5"));
//! assert_eq!(analyze(&doc).swish_layers, 1);
//! ```

mod config;
pub mod document;
mod error;
mod layer;
mod loader;
pub mod rewrite;
mod stats;

pub use config::{validate_ratio, OptimizerConfig};
pub use document::{Document, Entry, Header};
pub use error::ParamError;
pub use layer::{AttrValue, ConvParams, LayerRecord, LayerType};
pub use loader::{paired_weights_path, BadAttributePolicy, ParamLoader, ParseOptions};
pub use rewrite::{substitute, ActivationSwap, RewritePolicy, Substitution, ToHardSwish, ToReLU};
pub use stats::{analyze, ConvDetail, ModelStats, TypeCount};
