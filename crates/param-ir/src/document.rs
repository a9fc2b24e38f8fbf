// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The parsed layer description: header plus ordered entries.
//!
//! Declaration order defines the computation graph, so entries are kept in
//! file order and every transformation preserves it. Lines that are not layer
//! records are carried as [`Entry::Passthrough`] so nothing is lost when the
//! document is written back.
//!
//! # Round trip
//!
//! ```text
//! text ──parse──▶ Document ──serialize──▶ text'
//! ```
//!
//! `text'` equals `text` up to whitespace between tokens, a trailing newline
//! on every line, and attribute keys sorted ascending.

use crate::{LayerRecord, LayerType, ParamError, ParamLoader, ParseOptions};
use std::fmt;

// ── Header ─────────────────────────────────────────────────────────

/// The file header. Passed through unchanged, never rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Tokens of the magic line (`7767517`, possibly followed by counts).
    pub magic: Vec<String>,
    /// Tokens of the separate counts line, when the file has one.
    pub counts: Option<Vec<String>>,
}

impl Header {
    /// Whether `token` is the magic value that opens the file.
    pub fn is_sentinel(&self, token: &str) -> bool {
        self.magic.first().is_some_and(|m| m == token)
    }

    /// Declared `(layer_count, blob_count)`, from the counts line or from the
    /// magic line's trailing tokens.
    pub fn declared_counts(&self) -> Option<(usize, usize)> {
        let tokens = match &self.counts {
            Some(counts) => counts.as_slice(),
            None => self.magic.get(1..)?,
        };
        match tokens {
            [layers, blobs, ..] => Some((layers.parse().ok()?, blobs.parse().ok()?)),
            _ => None,
        }
    }
}

// ── Entries ────────────────────────────────────────────────────────

/// One line of the body.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A parsed layer record.
    Layer(LayerRecord),
    /// A non-layer line, re-emitted verbatim.
    Passthrough(String),
}

// ── Document ───────────────────────────────────────────────────────

/// A parsed `.param` file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub header: Header,
    /// Body lines in declaration order.
    pub entries: Vec<Entry>,
}

impl Document {
    /// Parses text with the default (strict) options.
    pub fn parse(text: &str) -> Result<Self, ParamError> {
        ParamLoader::parse(text, ParseOptions::default())
    }

    /// Returns an iterator over the layer records in declaration order.
    pub fn layers(&self) -> impl Iterator<Item = &LayerRecord> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Layer(layer) => Some(layer),
            Entry::Passthrough(_) => None,
        })
    }

    /// Number of layer records (passthrough lines excluded).
    pub fn num_layers(&self) -> usize {
        self.layers().count()
    }

    /// Number of layer records of the given type.
    pub fn count_type(&self, layer_type: &LayerType) -> usize {
        self.layers().filter(|l| &l.layer_type == layer_type).count()
    }

    /// Finds a layer by name.
    pub fn layer(&self, name: &str) -> Option<&LayerRecord> {
        self.layers().find(|l| l.name == name)
    }

    /// Declared `(layer_count, blob_count)` from the header.
    pub fn header_counts(&self) -> Option<(usize, usize)> {
        self.header.declared_counts()
    }

    /// Whether the declared layer count disagrees with the parsed records.
    pub fn header_mismatch(&self) -> Option<(usize, usize)> {
        let (declared, _) = self.header_counts()?;
        let actual = self.num_layers();
        (declared != actual).then_some((declared, actual))
    }

    /// Serializes back to `.param` text. Every line ends with `\n`.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Returns a one-line description of the document.
    pub fn summary(&self) -> String {
        let passthrough = self.entries.len() - self.num_layers();
        format!(
            "{} layers, {} passthrough lines, header {}",
            self.num_layers(),
            passthrough,
            match self.header_counts() {
                Some((layers, blobs)) => format!("declares {layers} layers / {blobs} blobs"),
                None => "without counts".to_string(),
            },
        )
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.header.magic.is_empty() {
            writeln!(f, "{}", self.header.magic.join(" "))?;
        }
        if let Some(counts) = &self.header.counts {
            writeln!(f, "{}", counts.join(" "))?;
        }
        for entry in &self.entries {
            match entry {
                Entry::Layer(layer) => writeln!(f, "{layer}")?,
                Entry::Passthrough(raw) => writeln!(f, "{raw}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttrValue;

    const SAMPLE: &str = "7767517\n4 5\nInput input 0 1 input\nConvolution conv_0 1 1 input a 0=64 1=3 6=1728\nSwish silu_0 1 1 a b\nSwish silu_1 1 1 b c\n";

    #[test]
    fn test_serialize_is_identity_on_normalized_text() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert_eq!(doc.serialize(), SAMPLE);
    }

    #[test]
    fn test_serialize_normalizes_whitespace() {
        let text = "7767517\n1 1\nConvolution   conv_0  1 1   in  out   1=3 0=8\n";
        let doc = Document::parse(text).unwrap();
        assert_eq!(
            doc.serialize(),
            "7767517\n1 1\nConvolution conv_0 1 1 in out 0=8 1=3\n"
        );
    }

    #[test]
    fn test_raw_values_survive() {
        let text = "7767517\n1 2\nBinaryOp add 2 1 a b c 0=0 1=1 2=1.000000e-03\n";
        let doc = Document::parse(text).unwrap();
        let layer = doc.layer("add").unwrap();
        assert_eq!(layer.attr(2), Some(&AttrValue::Raw("1.000000e-03".into())));
        assert_eq!(doc.serialize(), text);
    }

    #[test]
    fn test_header_counts() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert_eq!(doc.header_counts(), Some((4, 5)));
        assert_eq!(doc.header_mismatch(), None);

        let doc = Document::parse("7767517\n9 9\nInput in 0 1 in\n").unwrap();
        assert_eq!(doc.header_mismatch(), Some((9, 1)));

        let doc = Document::parse("7767517\nInput in 0 1 in\n").unwrap();
        assert_eq!(doc.header_counts(), None);
    }

    #[test]
    fn test_count_type_and_lookup() {
        let doc = Document::parse(SAMPLE).unwrap();
        assert_eq!(doc.count_type(&LayerType::Swish), 2);
        assert_eq!(doc.count_type(&LayerType::Pooling), 0);
        assert!(doc.layer("silu_1").is_some());
        assert!(doc.layer("missing").is_none());
    }

    #[test]
    fn test_iter_layers_in_order() {
        let doc = Document::parse(SAMPLE).unwrap();
        let names: Vec<_> = doc.layers().map(|l| l.name.as_str()).collect();
        assert_eq!(names, &["input", "conv_0", "silu_0", "silu_1"]);
    }

    #[test]
    fn test_summary() {
        let doc = Document::parse(SAMPLE).unwrap();
        let s = doc.summary();
        assert!(s.contains("4 layers"));
        assert!(s.contains("declares 4 layers / 5 blobs"));
    }

    #[test]
    fn test_empty_document_serializes_empty() {
        assert_eq!(Document::default().serialize(), "");
    }
}
