// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `hardswish` / `relu` modes: rewrite activations and write the result.
//!
//! The output is built in memory and written to a temporary sibling file that
//! is renamed over the destination, so a failed run never leaves a partial
//! `.param` behind.

use super::Console;
use anyhow::Context;
use param_ir::{paired_weights_path, ActivationSwap, Document, LayerType};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn execute(
    console: &Console,
    document: &Document,
    swap: ActivationSwap,
    input: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    let policy = swap.policy();

    console.line("");
    console.line(format!("🔧 Applying SiLU → {} substitution...", policy.name()));
    console.line(format!(
        "   Found {} Swish layers",
        document.count_type(&LayerType::Swish),
    ));

    let result = policy.apply(document);
    if result.rejected > 0 {
        tracing::warn!("{} structural rewrites were rejected", result.rejected);
    }

    write_atomic(output, &result.document.serialize())?;

    console.line(format!(
        "   Replaced {} Swish layers with {}",
        result.rewritten,
        policy.name(),
    ));
    console.line("");
    console.line(format!("✅ Saved: {}", output.display()));
    console.line(format!(
        "   Weights: reuse {} unchanged (attribute-only rewrite)",
        paired_weights_path(input).display(),
    ));
    Ok(())
}

/// Writes `contents` to `path` through a temporary file and a rename.
///
/// The temporary file is created exclusively, so an existing file with the
/// same name is never clobbered, and it is removed on every error path.
fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let tmp = temp_sibling(path);
    let written = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp)
        .and_then(|mut file| {
            file.write_all(contents.as_bytes())?;
            file.sync_all()
        });
    if let Err(e) = written {
        if e.kind() != std::io::ErrorKind::AlreadyExists {
            let _ = fs::remove_file(&tmp);
        }
        return Err(e).with_context(|| format!("failed to write '{}'", tmp.display()));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to write '{}'", path.display()));
    }
    tracing::debug!("wrote {} bytes to '{}'", contents.len(), path.display());
    Ok(())
}

/// `<dir>/.<name>.<pid>.tmp`, next to the destination so the rename stays on
/// one filesystem.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_temp_sibling() {
        let tmp = temp_sibling(Path::new("out/model_opt.param"));
        assert_eq!(tmp.parent(), Some(Path::new("out")));
        let name = tmp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".model_opt.param."));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.param");
        fs::write(&path, "old").unwrap();
        write_atomic(&path, "new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        assert_eq!(dir_entries(dir.path()), vec!["m.param"]);
    }

    #[test]
    fn test_write_atomic_leaves_unrelated_tmp_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.param");
        let other = dir.path().join("m.param.tmp");
        fs::write(&other, "keep").unwrap();
        write_atomic(&path, "new\n").unwrap();
        assert_eq!(fs::read_to_string(&other).unwrap(), "keep");
    }

    #[test]
    fn test_write_atomic_does_not_clobber_existing_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.param");
        let tmp = temp_sibling(&path);
        fs::write(&tmp, "someone else's").unwrap();
        assert!(write_atomic(&path, "new\n").is_err());
        assert_eq!(fs::read_to_string(&tmp).unwrap(), "someone else's");
        assert!(!path.exists());
    }

    #[test]
    fn test_write_atomic_cleans_up_when_rename_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory at the destination makes the rename fail.
        let path = dir.path().join("m.param");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("inner"), "x").unwrap();
        assert!(write_atomic(&path, "new\n").is_err());
        assert_eq!(dir_entries(dir.path()), vec!["m.param"]);
    }

    #[test]
    fn test_write_atomic_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("m.param");
        assert!(write_atomic(&path, "x").is_err());
        assert_eq!(dir_entries(dir.path()), Vec::<String>::new());
    }
}
