// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layer records for the ncnn layer-description IR.
//!
//! Each [`LayerRecord`] is one line of a `.param` file:
//!
//! ```text
//! Convolution  conv_0  1 1 images a  0=16 1=3 3=2 4=1 5=1 6=432
//! └── type ──┘ └name┘  └─topology─┘  └──────── attributes ───────┘
//! ```
//!
//! Weight data is **not** part of the record. The paired `.bin` file holds it,
//! and only attribute 6 (`weight_data_size`) of a convolution hints at its size.

use std::collections::BTreeMap;
use std::fmt;

/// The operator kind of a layer.
///
/// Known ncnn operators get their own variant. Anything else is kept as
/// [`LayerType::Other`] with the tag preserved verbatim, so unknown operators
/// survive a parse/serialize cycle untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LayerType {
    /// Graph entry point (image or tensor input).
    Input,
    /// Dense 2D convolution.
    Convolution,
    /// Depthwise / grouped 2D convolution.
    ConvolutionDepthWise,
    /// SiLU activation, `x * sigmoid(x)`.
    Swish,
    /// Piecewise-linear approximation of Swish.
    HardSwish,
    /// Rectified linear unit.
    ReLU,
    Sigmoid,
    Pooling,
    Concat,
    Split,
    BinaryOp,
    Interp,
    Reshape,
    Permute,
    Softmax,
    Crop,
    Eltwise,
    /// Any operator tag not listed above.
    Other(String),
}

impl LayerType {
    /// Maps an ncnn operator tag to a layer type. Tags are case-sensitive.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Input" => Self::Input,
            "Convolution" => Self::Convolution,
            "ConvolutionDepthWise" => Self::ConvolutionDepthWise,
            "Swish" => Self::Swish,
            "HardSwish" => Self::HardSwish,
            "ReLU" => Self::ReLU,
            "Sigmoid" => Self::Sigmoid,
            "Pooling" => Self::Pooling,
            "Concat" => Self::Concat,
            "Split" => Self::Split,
            "BinaryOp" => Self::BinaryOp,
            "Interp" => Self::Interp,
            "Reshape" => Self::Reshape,
            "Permute" => Self::Permute,
            "Softmax" => Self::Softmax,
            "Crop" => Self::Crop,
            "Eltwise" => Self::Eltwise,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the ncnn operator tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Input => "Input",
            Self::Convolution => "Convolution",
            Self::ConvolutionDepthWise => "ConvolutionDepthWise",
            Self::Swish => "Swish",
            Self::HardSwish => "HardSwish",
            Self::ReLU => "ReLU",
            Self::Sigmoid => "Sigmoid",
            Self::Pooling => "Pooling",
            Self::Concat => "Concat",
            Self::Split => "Split",
            Self::BinaryOp => "BinaryOp",
            Self::Interp => "Interp",
            Self::Reshape => "Reshape",
            Self::Permute => "Permute",
            Self::Softmax => "Softmax",
            Self::Crop => "Crop",
            Self::Eltwise => "Eltwise",
            Self::Other(tag) => tag,
        }
    }

    /// Whether this layer carries a convolution weight blob.
    pub fn is_convolution(&self) -> bool {
        matches!(self, Self::Convolution | Self::ConvolutionDepthWise)
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for LayerType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The value half of a `key=value` attribute token.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f32),
    /// Kept verbatim: exponent notation, array values (`2,1.0,2.0`), or any
    /// token whose numeric form would not print back identically.
    Raw(String),
}

impl AttrValue {
    /// Classifies a raw value token.
    ///
    /// A token becomes `Int` or `Float` only when the typed value prints back
    /// to exactly the same text, so serialization never alters a value.
    pub fn from_token(token: &str) -> Self {
        if let Ok(v) = token.parse::<i64>() {
            if v.to_string() == token {
                return Self::Int(v);
            }
        }
        if let Ok(v) = token.parse::<f32>() {
            if v.is_finite() && v.to_string() == token {
                return Self::Float(v);
            }
        }
        Self::Raw(token.to_string())
    }

    /// Returns the integer value, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Raw(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

/// One operator node of the layer description.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LayerRecord {
    /// Operator kind.
    pub layer_type: LayerType,
    /// Layer name, unique within a file by convention (not enforced).
    pub name: String,
    /// `input_count output_count bottom... top...`, preserved verbatim.
    pub topology: Vec<String>,
    /// Operator parameters keyed by ncnn parameter id, ascending.
    pub attributes: BTreeMap<i32, AttrValue>,
}

impl LayerRecord {
    /// Creates a record without attributes.
    pub fn new(layer_type: LayerType, name: impl Into<String>, topology: Vec<String>) -> Self {
        Self {
            layer_type,
            name: name.into(),
            topology,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: i32, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key, value.into());
        self
    }

    /// Returns the attribute stored at `key`.
    pub fn attr(&self, key: i32) -> Option<&AttrValue> {
        self.attributes.get(&key)
    }

    /// Reads an integer attribute, falling back to `default` when the key is
    /// absent or the value is not an integer.
    pub fn attr_int(&self, key: i32, default: i64) -> i64 {
        self.attr(key).and_then(AttrValue::as_int).unwrap_or(default)
    }

    /// Declared number of input blobs (first topology token).
    pub fn input_count(&self) -> Option<usize> {
        self.topology.first()?.parse().ok()
    }

    /// Declared number of output blobs (second topology token).
    pub fn output_count(&self) -> Option<usize> {
        self.topology.get(1)?.parse().ok()
    }

    /// Whether the listed blob names match the declared input/output counts.
    /// `None` when the counts are missing or not integers.
    pub fn blob_counts_consistent(&self) -> Option<bool> {
        let declared = self.input_count()?.checked_add(self.output_count()?);
        Some(declared == Some(self.topology.len() - 2))
    }

    /// Typed view over convolution parameters; `None` for other operators.
    pub fn conv_params(&self) -> Option<ConvParams> {
        if !self.layer_type.is_convolution() {
            return None;
        }
        Some(ConvParams {
            out_channels: self.attr_int(ConvParams::OUT_CHANNELS, 0),
            kernel: self.attr_int(ConvParams::KERNEL, 0),
            weight_size: self.attr_int(ConvParams::WEIGHT_SIZE, 0),
        })
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}): {} topology fields, {} attributes",
            self.name,
            self.layer_type,
            self.topology.len(),
            self.attributes.len(),
        )
    }
}

/// Formats the record as a `.param` line (no trailing newline).
impl fmt::Display for LayerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.layer_type, self.name)?;
        for field in &self.topology {
            write!(f, " {field}")?;
        }
        for (key, value) in &self.attributes {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Convolution parameters by ncnn parameter id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvParams {
    pub out_channels: i64,
    pub kernel: i64,
    /// Number of weight elements stored in the paired `.bin` file.
    pub weight_size: i64,
}

impl ConvParams {
    pub const OUT_CHANNELS: i32 = 0;
    pub const KERNEL: i32 = 1;
    pub const WEIGHT_SIZE: i32 = 6;
}
