// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Optimizer configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! top_k = 10
//! output_suffix = "_opt"
//! on_bad_attribute = "fail"   # or "skip"
//! channel_ratio = 0.75
//! ```

use crate::{BadAttributePolicy, ParamError, ParseOptions};
use std::path::{Path, PathBuf};

/// Configuration for the optimizer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OptimizerConfig {
    /// How many of the heaviest convolutions to list in a report.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Appended to the input file stem to build the default output path.
    #[serde(default = "default_suffix")]
    pub output_suffix: String,
    /// What the parser does with malformed `key=value` tokens.
    #[serde(default)]
    pub on_bad_attribute: BadAttributePolicy,
    /// Target channel keep ratio shown by the channel-pruning guidance.
    #[serde(default = "default_ratio")]
    pub channel_ratio: f64,
}

fn default_top_k() -> usize {
    10
}

fn default_suffix() -> String {
    "_opt".to_string()
}

fn default_ratio() -> f64 {
    0.75
}

impl OptimizerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ParamError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ParamError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ParamError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ParamError::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ParamError> {
        toml::to_string_pretty(self)
            .map_err(|e| ParamError::Config(format!("TOML serialise error: {e}")))
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ParamError> {
        validate_ratio(self.channel_ratio)?;
        if self.output_suffix.is_empty() {
            return Err(ParamError::Config(
                "output_suffix must not be empty (it would overwrite the input)".into(),
            ));
        }
        Ok(())
    }

    /// Parser options derived from this config.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            on_bad_attribute: self.on_bad_attribute,
        }
    }

    /// Default output path: `<dir>/<stem><suffix>.<ext>` next to the input.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = match input.extension() {
            Some(ext) => format!("{stem}{}.{}", self.output_suffix, ext.to_string_lossy()),
            None => format!("{stem}{}", self.output_suffix),
        };
        input.with_file_name(file_name)
    }
}

/// Channel ratios must lie in `(0, 1]`.
pub fn validate_ratio(ratio: f64) -> Result<(), ParamError> {
    if ratio > 0.0 && ratio <= 1.0 {
        Ok(())
    } else {
        Err(ParamError::Config(format!(
            "channel ratio {ratio} out of range; expected a value in (0, 1]"
        )))
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            output_suffix: default_suffix(),
            on_bad_attribute: BadAttributePolicy::Fail,
            channel_ratio: default_ratio(),
        }
    }
}
