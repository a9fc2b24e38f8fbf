// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: parse → rewrite → serialize → analyze.
//!
//! These run the public API end-to-end over a description shaped like an
//! exported YOLOv8 backbone head.

use param_ir::{
    analyze, substitute, ActivationSwap, Document, LayerType, ParamLoader, ParseOptions,
    RewritePolicy, ToHardSwish, ToReLU,
};

// ── Helpers ────────────────────────────────────────────────────

const YOLO_PARAM: &str = "7767517
14 17
Input            in0                      0 1 in0
Convolution      conv_0                   1 1 in0 1 0=16 1=3 3=2 4=1 5=1 6=432
Swish            silu_67                  1 1 1 2
Convolution      conv_1                   1 1 2 3 0=32 1=3 3=2 4=1 5=1 6=4608
Swish            silu_68                  1 1 3 4
Split            splitncnn_0              1 2 4 5 6
Convolution      conv_2                   1 1 5 7 0=16 1=1 5=1 6=512
Swish            silu_69                  1 1 7 8
Convolution      conv_3                   1 1 6 9 0=16 1=1 5=1 6=512
Swish            silu_70                  1 1 9 10
Pooling          pool_0                   1 1 10 11 0=0 1=5 11=5 2=1 12=1 3=2 13=2 14=2 15=2 5=1
Concat           cat_0                    2 1 8 11 12 0=0
BinaryOp         add_0                    2 1 12 12 13 0=0 2=1.000000e-03
Reshape          view_0                   1 1 13 out0 -23309=2,1.0,2.0 0=-1
";

/// Builds a synthetic description with `n` conv/swish pairs.
fn synthetic(n: usize) -> String {
    let mut text = format!("7767517\n{} {}\nInput in 0 1 b0\n", 2 * n + 1, 2 * n + 1);
    for i in 0..n {
        let (src, mid, dst) = (2 * i, 2 * i + 1, 2 * i + 2);
        text.push_str(&format!(
            "Convolution conv_{i} 1 1 b{src} b{mid} 0=32 1=3 5=1 6={}\n",
            (i % 4) * 100
        ));
        text.push_str(&format!("Swish silu_{i} 1 1 b{mid} b{dst}\n"));
    }
    text
}

// ── Round trip ─────────────────────────────────────────────────

#[test]
fn test_roundtrip_structural_equality() {
    for text in [YOLO_PARAM.to_string(), synthetic(25)] {
        let doc = Document::parse(&text).unwrap();
        let back = Document::parse(&doc.serialize()).unwrap();
        assert_eq!(back, doc);
    }
}

#[test]
fn test_roundtrip_preserves_tokens() {
    let doc = Document::parse(YOLO_PARAM).unwrap();
    let out = doc.serialize();
    assert!(out.contains("BinaryOp add_0 2 1 12 12 13 0=0 2=1.000000e-03\n"));
    // Keys come out ascending, negative array keys first.
    assert!(out.contains("Reshape view_0 1 1 13 out0 -23309=2,1.0,2.0 0=-1\n"));
    assert!(out.contains(
        "Pooling pool_0 1 1 10 11 0=0 1=5 2=1 3=2 5=1 11=5 12=1 13=2 14=2 15=2\n"
    ));
    assert!(out.starts_with("7767517\n14 17\n"));
}

#[test]
fn test_roundtrip_with_passthrough_lines() {
    let text = "7767517\n2 2\nInput in 0 1 a\n\nstray\nSwish silu_0 1 1 a b\n";
    let doc = Document::parse(text).unwrap();
    assert_eq!(doc.serialize(), text);
    assert_eq!(Document::parse(&doc.serialize()).unwrap(), doc);
}

// ── Substitution ───────────────────────────────────────────────

#[test]
fn test_hardswish_totality() {
    let doc = Document::parse(&synthetic(40)).unwrap();
    let swish_before = doc.count_type(&LayerType::Swish);

    let result = ToHardSwish.apply(&doc);
    assert_eq!(result.rewritten, swish_before);
    assert_eq!(result.document.count_type(&LayerType::Swish), 0);
    assert_eq!(result.document.count_type(&LayerType::HardSwish), swish_before);
    assert_eq!(result.document.num_layers(), doc.num_layers());
}

#[test]
fn test_relu_totality_preserves_order_and_topology() {
    let doc = Document::parse(YOLO_PARAM).unwrap();
    let result = ToReLU.apply(&doc);
    assert_eq!(result.rewritten, 4);

    let before: Vec<_> = doc.layers().map(|l| l.topology.clone()).collect();
    let after: Vec<_> = result.document.layers().map(|l| l.topology.clone()).collect();
    assert_eq!(before, after);

    let names: Vec<_> = result
        .document
        .layers()
        .filter(|l| l.layer_type == LayerType::ReLU)
        .map(|l| l.name.as_str())
        .collect();
    assert_eq!(names, vec!["relu_67", "relu_68", "relu_69", "relu_70"]);
}

#[test]
fn test_hardswish_attribute_fixed_point() {
    let doc = Document::parse("7767517\n1 2\nSwish silu_1 1 1 a b 0=3 1=4 2=5\n").unwrap();
    let out = ToHardSwish.apply(&doc).document.serialize();
    assert_eq!(out, "7767517\n1 2\nHardSwish hardswish_1 1 1 a b 0=0.166667 1=0.5 2=5\n");
}

#[test]
fn test_no_swish_is_noop() {
    let text = "7767517\n2 2\nInput in 0 1 a\nConvolution conv_0 1 1 a b 0=8 1=1 6=64\n";
    let doc = Document::parse(text).unwrap();
    for swap in [ActivationSwap::HardSwish, ActivationSwap::Relu] {
        let result = swap.policy().apply(&doc);
        assert_eq!(result.rewritten, 0);
        assert_eq!(result.document.serialize(), text);
    }
}

#[test]
fn test_rewrite_output_reparses() {
    let doc = Document::parse(YOLO_PARAM).unwrap();
    let rewritten = ToHardSwish.apply(&doc).document;
    let back = Document::parse(&rewritten.serialize()).unwrap();
    assert_eq!(back, rewritten);
}

#[test]
fn test_generic_substitute_with_closures() {
    let doc = Document::parse(YOLO_PARAM).unwrap();
    let result = substitute(
        &doc,
        |l| l.name.starts_with("silu_6"),
        |l| ToReLU.rewrite(l),
    );
    assert_eq!(result.rewritten, 3);
    assert_eq!(result.document.count_type(&LayerType::Swish), 1);
}

// ── Analysis ───────────────────────────────────────────────────

#[test]
fn test_analyze_yolo_head() {
    let stats = analyze(&Document::parse(YOLO_PARAM).unwrap());
    assert_eq!(stats.total_layers, 13);
    assert_eq!(stats.input_layers, 1);
    assert_eq!(stats.conv_layers, 4);
    assert_eq!(stats.swish_layers, 4);
    assert_eq!(stats.pooling_layers, 1);
    assert_eq!(stats.concat_layers, 1);
    assert_eq!(stats.total_params_estimate, 432 + 4608 + 512 + 512);

    let top: Vec<_> = stats.top_convolutions(3).iter().map(|c| c.name.as_str()).collect();
    assert_eq!(top, vec!["conv_1", "conv_2", "conv_3"]);
}

#[test]
fn test_analyze_deterministic() {
    let doc = Document::parse(&synthetic(30)).unwrap();
    let a = analyze(&doc);
    let b = analyze(&doc);
    assert_eq!(a, b);
    assert_eq!(a.top_convolutions(10), b.top_convolutions(10));
    // Weight sizes cycle 0,100,200,300: the first four 300s lead, in order.
    let top: Vec<_> = a.top_convolutions(4).iter().map(|c| c.name.as_str()).collect();
    assert_eq!(top, vec!["conv_3", "conv_7", "conv_11", "conv_15"]);
}

// ── Reference scenario ─────────────────────────────────────────

#[test]
fn test_reference_scenario() {
    let text = "7767517 3 4\nInput input 0 1 input\nConvolution conv_0 1 1 input a 0=64 1=3 6=1728\nSwish silu_0 1 1 a b\n";
    let doc = ParamLoader::parse(text, ParseOptions::default()).unwrap();

    let stats = analyze(&doc);
    assert_eq!(stats.conv_layers, 1);
    assert_eq!(stats.swish_layers, 1);
    assert_eq!(stats.total_params_estimate, 1728);

    let out = ToHardSwish.apply(&doc).document.serialize();
    assert!(out.lines().any(|l| l == "HardSwish hardswish_0 1 1 a b 0=0.166667 1=0.5"));
    assert!(out.starts_with("7767517 3 4\n"));
}
