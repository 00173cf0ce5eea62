//! Feature page generation from the root build's measures artifact.
//!
//! The root scroll build emits `measures.json`, a catalog of the measures
//! tracked across the content tree. Each measure gets a derived page under
//! `features/` so the folder build can render it alongside hand-written
//! content.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// One measure record from `measures.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Measure {
    pub name: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// Errors from feature page generation.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("failed to read {path}: {source}")]
    ReadArtifact { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    ParseArtifact {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    WritePage { path: PathBuf, source: io::Error },
}

/// Writes all derived feature pages for a site root.
pub trait FeaturePages: Send + Sync {
    /// Write every feature page under `root`, returning how many were
    /// written. Must only run after the root build has produced its
    /// artifacts.
    fn write_all(&self, root: &Path) -> Result<usize, FeatureError>;
}

/// Feature pages derived from `measures.json`.
#[derive(Debug, Default)]
pub struct MeasureTables;

impl FeaturePages for MeasureTables {
    fn write_all(&self, root: &Path) -> Result<usize, FeatureError> {
        let artifact = root.join("measures.json");
        let raw = fs::read_to_string(&artifact).map_err(|source| FeatureError::ReadArtifact {
            path: artifact.clone(),
            source,
        })?;

        let measures: Vec<Measure> =
            serde_json::from_str(&raw).map_err(|source| FeatureError::ParseArtifact {
                path: artifact,
                source,
            })?;

        let dir = root.join("features");
        fs::create_dir_all(&dir).map_err(|source| FeatureError::WritePage {
            path: dir.clone(),
            source,
        })?;

        for measure in &measures {
            let path = dir.join(format!("{}.scroll", measure.name));
            fs::write(&path, render_page(measure)).map_err(|source| FeatureError::WritePage {
                path: path.clone(),
                source,
            })?;
        }

        tracing::info!("wrote {} feature pages", measures.len());
        Ok(measures.len())
    }
}

fn render_page(measure: &Measure) -> String {
    let title = measure.title.as_deref().unwrap_or(&measure.name);

    let mut page = format!("title {title}\n\ntags measure\n");
    if let Some(description) = &measure.description {
        page.push('\n');
        page.push_str(description);
        page.push('\n');
    }
    page
}
