//! Windows compatibility patch for the scroll CLI.
//!
//! scroll's `root.parsers` resolves file paths with `Utils.posix.*`, which
//! mangles drive-letter paths on Windows. Before building we rewrite those
//! calls to Node's platform-neutral `path` module, in place, with no backup.
//! A substring probe keeps the rewrite idempotent.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Substring that marks an unpatched file.
const POSIX_MARKER: &str = "Utils.posix.dirname";

/// The two call rewrites, applied to every occurrence.
const REWRITES: [(&str, &str); 2] = [
    (
        "Utils.posix.dirname(this.filePath)",
        "require(\"path\").dirname(this.filePath)",
    ),
    (
        "Utils.posix.basename(this.filePath)",
        "require(\"path\").basename(this.filePath)",
    ),
];

/// Result of the pure text rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The source used POSIX path calls; this is the rewritten text.
    Patched(String),
    /// Already patched or never used the POSIX calls; nothing to write.
    Unchanged,
}

/// Rewrite POSIX-specific path calls to the platform-neutral `path` module.
pub fn rewrite_posix_paths(source: &str) -> PatchOutcome {
    if !source.contains(POSIX_MARKER) {
        return PatchOutcome::Unchanged;
    }

    let mut text = source.to_string();
    for (pattern, replacement) in REWRITES {
        text = text.replace(pattern, replacement);
    }
    PatchOutcome::Patched(text)
}

/// Errors from the file layer of the patcher.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Files rewritten by a patch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PatchSummary {
    pub files_patched: usize,
}

fn primary_target(root: &Path) -> PathBuf {
    root.join("node_modules")
        .join("scroll-cli")
        .join("parsers")
        .join("root.parsers")
}

fn nested_target(root: &Path) -> PathBuf {
    root.join("node_modules")
        .join("scroll-cli")
        .join("node_modules")
        .join("scroll-cli")
        .join("parsers")
        .join("root.parsers")
}

/// Read, rewrite, and write back a single file. Returns whether it changed.
fn rewrite_file(path: &Path) -> Result<bool, PatchError> {
    let content = fs::read_to_string(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match rewrite_posix_paths(&content) {
        PatchOutcome::Patched(text) => {
            fs::write(path, text).map_err(|source| PatchError::Write {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(true)
        }
        PatchOutcome::Unchanged => Ok(false),
    }
}

/// Patch the scroll CLI installed under `root`, covering the nested copy too.
///
/// A missing `root.parsers` is skipped silently: a scroll install without it
/// does not need the patch. When the primary copy is already patched the
/// nested copy is left alone as well.
pub fn patch_tree(root: &Path) -> Result<PatchSummary, PatchError> {
    let primary = primary_target(root);
    if !primary.exists() {
        tracing::debug!("{} not found, skipping patch", primary.display());
        return Ok(PatchSummary::default());
    }

    let mut summary = PatchSummary::default();
    if rewrite_file(&primary)? {
        tracing::info!("patched {}", primary.display());
        summary.files_patched += 1;

        let nested = nested_target(root);
        if nested.exists() && rewrite_file(&nested)? {
            tracing::info!("patched nested copy {}", nested.display());
            summary.files_patched += 1;
        }
    } else {
        tracing::debug!("scroll CLI already patched or uses compatible paths");
    }

    Ok(summary)
}

/// Apply the patch only on Windows; a no-op everywhere else.
pub fn patch_for_platform(root: &Path) -> Result<PatchSummary, PatchError> {
    if !cfg!(windows) {
        tracing::debug!("not on Windows, skipping scroll compatibility patch");
        return Ok(PatchSummary::default());
    }
    patch_tree(root)
}
