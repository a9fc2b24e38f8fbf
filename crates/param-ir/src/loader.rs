// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Loading and parsing of `.param` layer descriptions.
//!
//! The text format is line oriented:
//!
//! ```text
//! 7767517                      ← magic
//! 3 4                          ← layer_count blob_count (optional line)
//! Input input 0 1 input        ← one layer per line
//! Convolution conv_0 1 1 input a 0=64 1=3 6=1728
//! ```
//!
//! Only the text is read. The paired `.bin` weight file is never opened; see
//! [`paired_weights_path`].

use crate::document::{Entry, Header};
use crate::{AttrValue, Document, LayerRecord, LayerType, ParamError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What to do with a layer line that has a malformed `key=value` token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadAttributePolicy {
    /// Stop at the first malformed line with [`ParamError::Parse`].
    #[default]
    Fail,
    /// Keep the malformed line verbatim as a passthrough entry, log a warning
    /// and continue.
    Skip,
}

/// Parser options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub on_bad_attribute: BadAttributePolicy,
}

impl ParseOptions {
    /// Options that skip malformed lines instead of failing.
    pub fn lenient() -> Self {
        Self {
            on_bad_attribute: BadAttributePolicy::Skip,
        }
    }
}

/// Loads layer descriptions from disk or from memory.
///
/// # Example
/// ```no_run
/// use param_ir::{ParamLoader, ParseOptions};
/// use std::path::Path;
///
/// let doc = ParamLoader::load(Path::new("yolov8n.param"), ParseOptions::default()).unwrap();
/// println!("{}", doc.summary());
/// ```
pub struct ParamLoader;

impl ParamLoader {
    /// Reads and parses a `.param` file.
    pub fn load(path: &Path, options: ParseOptions) -> Result<Document, ParamError> {
        if !path.exists() {
            return Err(ParamError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        tracing::debug!("read {} bytes from '{}'", text.len(), path.display());
        Self::parse(&text, options)
    }

    /// Parses `.param` text.
    ///
    /// The first non-empty line is the magic line. A following line made of
    /// integers only is taken as the counts line. Every later line with at
    /// least two tokens is a layer record; anything else (blank lines, single
    /// tokens, a repeated magic line) is kept as a passthrough entry.
    pub fn parse(text: &str, options: ParseOptions) -> Result<Document, ParamError> {
        let mut header = Header::default();
        let mut entries = Vec::new();
        let mut state = HeaderState::AwaitMagic;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let tokens: Vec<&str> = raw.split_whitespace().collect();

            match state {
                HeaderState::AwaitMagic => {
                    if tokens.is_empty() {
                        continue;
                    }
                    header.magic = to_owned(&tokens);
                    state = HeaderState::AwaitCounts;
                    continue;
                }
                HeaderState::AwaitCounts => {
                    if tokens.is_empty() {
                        continue;
                    }
                    state = HeaderState::Body;
                    if tokens.iter().all(|t| t.parse::<i64>().is_ok()) {
                        header.counts = Some(to_owned(&tokens));
                        continue;
                    }
                }
                HeaderState::Body => {}
            }

            if tokens.len() < 2 || header.is_sentinel(tokens[0]) {
                entries.push(Entry::Passthrough(raw.to_string()));
                continue;
            }

            match parse_layer(&tokens, line_no, raw) {
                Ok(layer) => {
                    if layer.blob_counts_consistent() == Some(false) {
                        tracing::warn!(
                            "line {line_no}: '{}' lists {} blob names for declared counts {} {}",
                            layer.name,
                            layer.topology.len() - 2,
                            layer.topology[0],
                            layer.topology[1],
                        );
                    }
                    entries.push(Entry::Layer(layer));
                }
                Err(err) if options.on_bad_attribute == BadAttributePolicy::Skip => {
                    tracing::warn!("skipping malformed layer line: {err}");
                    entries.push(Entry::Passthrough(raw.to_string()));
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Document { header, entries })
    }
}

#[derive(Debug, Clone, Copy)]
enum HeaderState {
    AwaitMagic,
    AwaitCounts,
    Body,
}

fn to_owned(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

/// Parses `type name topology... key=value...` into a record.
///
/// Attribute tokens must form a contiguous tail: a plain token after the first
/// `key=value` is rejected.
fn parse_layer(tokens: &[&str], line_no: usize, raw: &str) -> Result<LayerRecord, ParamError> {
    let layer_type = LayerType::from_tag(tokens[0]);
    let name = tokens[1].to_string();
    let mut topology = Vec::new();
    let mut attributes = BTreeMap::new();

    for token in &tokens[2..] {
        match token.split_once('=') {
            Some((key, value)) => {
                let key: i32 = key.parse().map_err(|_| {
                    let digits = key.strip_prefix('-').unwrap_or(key);
                    let numeric = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
                    let detail = if numeric {
                        format!("attribute key out of range in `{token}`")
                    } else {
                        format!("non-numeric attribute key in `{token}`")
                    };
                    ParamError::parse(line_no, raw, detail)
                })?;
                if value.is_empty() {
                    return Err(ParamError::parse(
                        line_no,
                        raw,
                        format!("empty value for attribute key {key}"),
                    ));
                }
                if attributes.insert(key, AttrValue::from_token(value)).is_some() {
                    tracing::warn!("line {line_no}: attribute {key} of '{name}' repeated, keeping last");
                }
            }
            None if !attributes.is_empty() => {
                return Err(ParamError::parse(
                    line_no,
                    raw,
                    format!("topology token `{token}` after attributes"),
                ));
            }
            None => topology.push(token.to_string()),
        }
    }

    Ok(LayerRecord {
        layer_type,
        name,
        topology,
        attributes,
    })
}

/// Returns the `.bin` weight file paired with a `.param` description.
///
/// Attribute-only rewrites (activation swaps) keep this file valid as is.
/// Structural rewrites would require regenerating it, which this crate never
/// does.
pub fn paired_weights_path(param_path: &Path) -> PathBuf {
    param_path.with_extension("bin")
}
