// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for loading, parsing and configuring layer descriptions.

use std::path::PathBuf;

/// Errors that can occur when working with layer-description files.
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    /// The description file does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The description file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A layer line is malformed (e.g., a non-numeric attribute key).
    #[error("parse error at line {line}: {detail} (in `{content}`)")]
    Parse {
        /// 1-based line number in the source text.
        line: usize,
        /// The raw line content.
        content: String,
        /// What was wrong with it.
        detail: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ParamError {
    /// Builds a [`ParamError::Parse`] for the given line.
    pub(crate) fn parse(line: usize, content: &str, detail: impl Into<String>) -> Self {
        Self::Parse {
            line,
            content: content.to_string(),
            detail: detail.into(),
        }
    }

    /// Returns the offending line number for parse errors.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}
