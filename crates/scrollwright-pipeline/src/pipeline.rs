//! Five-stage site build pipeline.
//!
//! Stage order: parsers manifest, compatibility patch, root build, feature
//! pages, subfolder builds. Stages 1-4 abort the build on failure; stage 5
//! records a per-folder outcome and always runs to the end of the list.

use std::path::PathBuf;
use std::time::Instant;

use crate::features::{FeatureError, FeaturePages, MeasureTables};
use crate::patcher::{self, PatchError};
use crate::runner::{run_command, CommandError, Verbosity};

/// Build order matters: creators must build before lists.
pub const DEFAULT_SUBFOLDERS: [&str; 7] = [
    "blog", "books", "concepts", "creators", "features", "lists", "pages",
];

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Site root; every stage resolves against it.
    pub root: PathBuf,

    /// Subfolders to build after the root, in order.
    pub subfolders: Vec<String>,

    /// Command that generates the parsers manifest, run at the root.
    pub manifest_command: String,

    /// Command that builds a content folder, run at the root and in each
    /// subfolder. Embeds the scroll CLI's absolute path so folder builds
    /// resolve it from their own working directory.
    pub build_command: String,
}

impl PipelineConfig {
    /// Default configuration for a site rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let scroll_cli = root
            .join("node_modules")
            .join("scroll-cli")
            .join("scroll.js");

        Self {
            subfolders: DEFAULT_SUBFOLDERS.iter().map(|s| s.to_string()).collect(),
            manifest_command: "node cli.js buildParsersFile".to_string(),
            build_command: format!("node \"{}\" build", scroll_cli.display()),
            root,
        }
    }
}

/// Errors that abort the build.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("parsers manifest generation failed: {0}")]
    Manifest(#[source] CommandError),

    #[error("compatibility patch failed: {0}")]
    Patch(#[from] PatchError),

    #[error("root build failed: {0}")]
    RootBuild(#[source] CommandError),

    #[error("feature page generation failed: {0}")]
    Features(#[from] FeatureError),
}

/// Outcome of one subfolder build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderStatus {
    Built,
    /// Folder not present on disk; nothing to do.
    Skipped,
    Failed(String),
}

/// A subfolder paired with how its build went.
#[derive(Debug, Clone)]
pub struct FolderOutcome {
    pub folder: String,
    pub status: FolderStatus,
}

/// Result of a completed pipeline run.
#[derive(Debug)]
pub struct BuildReport {
    /// Feature pages written in stage 4.
    pub feature_pages: usize,

    /// One outcome per configured subfolder, in build order.
    pub folders: Vec<FolderOutcome>,

    /// Total build time in milliseconds.
    pub duration_ms: u64,
}

impl BuildReport {
    /// Folders whose build failed.
    pub fn failures(&self) -> impl Iterator<Item = &FolderOutcome> {
        self.folders
            .iter()
            .filter(|o| matches!(o.status, FolderStatus::Failed(_)))
    }
}

/// Site build pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    features: Box<dyn FeaturePages>,
}

impl Pipeline {
    /// Create a pipeline with the stock feature page writer.
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_features(config, Box::new(MeasureTables))
    }

    /// Create a pipeline with a custom feature page writer.
    pub fn with_features(config: PipelineConfig, features: Box<dyn FeaturePages>) -> Self {
        Self { config, features }
    }

    /// Run all five build stages in order.
    pub async fn run(&self) -> Result<BuildReport, PipelineError> {
        let start = Instant::now();
        let root = &self.config.root;

        tracing::info!("generating parsers manifest");
        run_command(&self.config.manifest_command, root, Verbosity::Streamed)
            .await
            .map_err(PipelineError::Manifest)?;

        tracing::info!("checking scroll Windows compatibility");
        patcher::patch_for_platform(root)?;

        tracing::info!("building root content tree");
        run_command(&self.config.build_command, root, Verbosity::Streamed)
            .await
            .map_err(PipelineError::RootBuild)?;

        tracing::info!("generating feature pages");
        let feature_pages = self.features.write_all(root)?;

        let mut folders = Vec::with_capacity(self.config.subfolders.len());
        for name in &self.config.subfolders {
            folders.push(self.build_folder(name).await);
        }

        Ok(BuildReport {
            feature_pages,
            folders,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Build one subfolder, tolerating failure.
    async fn build_folder(&self, name: &str) -> FolderOutcome {
        let dir = self.config.root.join(name);
        if !dir.is_dir() {
            tracing::debug!("{name}/ not present, skipping");
            return FolderOutcome {
                folder: name.to_string(),
                status: FolderStatus::Skipped,
            };
        }

        tracing::info!("building {name}/");
        match run_command(&self.config.build_command, &dir, Verbosity::Quiet).await {
            Ok(()) => FolderOutcome {
                folder: name.to_string(),
                status: FolderStatus::Built,
            },
            Err(err) => {
                tracing::warn!("{name}/ build had errors, continuing: {err}");
                FolderOutcome {
                    folder: name.to_string(),
                    status: FolderStatus::Failed(err.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    /// Feature writer that appends a marker to the shared log file.
    struct LogFeatures {
        log: PathBuf,
    }

    impl FeaturePages for LogFeatures {
        fn write_all(&self, _root: &Path) -> Result<usize, FeatureError> {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log)
                .unwrap();
            writeln!(file, "features").unwrap();
            Ok(0)
        }
    }

    /// Feature writer that always fails.
    struct FailingFeatures;

    impl FeaturePages for FailingFeatures {
        fn write_all(&self, root: &Path) -> Result<usize, FeatureError> {
            Err(FeatureError::ReadArtifact {
                path: root.join("measures.json"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            })
        }
    }

    fn test_config(root: &Path, log: &Path, subfolders: &[&str]) -> PipelineConfig {
        PipelineConfig {
            root: root.to_path_buf(),
            subfolders: subfolders.iter().map(|s| s.to_string()).collect(),
            manifest_command: format!("echo manifest >> \"{}\"", log.display()),
            build_command: format!("echo build:$(basename \"$PWD\") >> \"{}\"", log.display()),
        }
    }

    fn read_log(log: &Path) -> Vec<String> {
        fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn default_config_builds_the_fixed_folder_list() {
        let config = PipelineConfig::for_root("/site");

        assert_eq!(config.subfolders, DEFAULT_SUBFOLDERS);
        assert!(config.build_command.contains("scroll.js"));
    }

    #[tokio::test]
    async fn stages_run_in_order() {
        let temp = tempdir().unwrap();
        let log = temp.path().join("build.log");
        for dir in ["creators", "lists"] {
            fs::create_dir(temp.path().join(dir)).unwrap();
        }

        let config = test_config(temp.path(), &log, &["creators", "lists"]);
        let pipeline = Pipeline::with_features(config, Box::new(LogFeatures { log: log.clone() }));
        let report = pipeline.run().await.unwrap();

        let root_name = temp.path().file_name().unwrap().to_str().unwrap();
        assert_eq!(
            read_log(&log),
            vec![
                "manifest".to_string(),
                format!("build:{root_name}"),
                "features".to_string(),
                "build:creators".to_string(),
                "build:lists".to_string(),
            ]
        );
        assert!(report
            .folders
            .iter()
            .all(|o| o.status == FolderStatus::Built));
    }

    #[tokio::test]
    async fn folder_failure_does_not_stop_later_folders() {
        let temp = tempdir().unwrap();
        let log = temp.path().join("build.log");
        for dir in ["creators", "lists", "pages"] {
            fs::create_dir(temp.path().join(dir)).unwrap();
        }

        let mut config = test_config(temp.path(), &log, &["creators", "lists", "pages"]);
        config.build_command = format!(
            "if [ \"$(basename \"$PWD\")\" = lists ]; then exit 1; fi; echo build:$(basename \"$PWD\") >> \"{}\"",
            log.display()
        );

        let pipeline = Pipeline::with_features(config, Box::new(LogFeatures { log: log.clone() }));
        let report = pipeline.run().await.unwrap();

        let statuses: Vec<&FolderStatus> = report.folders.iter().map(|o| &o.status).collect();
        assert_eq!(statuses[0], &FolderStatus::Built);
        assert!(matches!(statuses[1], FolderStatus::Failed(_)));
        assert_eq!(statuses[2], &FolderStatus::Built);
        assert_eq!(report.failures().count(), 1);

        // The folder after the failure was still built.
        assert!(read_log(&log).contains(&"build:pages".to_string()));
    }

    #[tokio::test]
    async fn missing_folder_is_skipped_without_error() {
        let temp = tempdir().unwrap();
        let log = temp.path().join("build.log");
        for dir in ["blog", "pages"] {
            fs::create_dir(temp.path().join(dir)).unwrap();
        }

        let config = test_config(temp.path(), &log, &["blog", "lists", "pages"]);
        let pipeline = Pipeline::with_features(config, Box::new(LogFeatures { log: log.clone() }));
        let report = pipeline.run().await.unwrap();

        assert_eq!(report.folders[1].folder, "lists");
        assert_eq!(report.folders[1].status, FolderStatus::Skipped);
        assert_eq!(report.folders[2].status, FolderStatus::Built);
        assert!(!read_log(&log).contains(&"build:lists".to_string()));
    }

    #[tokio::test]
    async fn manifest_failure_aborts_before_any_build() {
        let temp = tempdir().unwrap();
        let log = temp.path().join("build.log");
        fs::create_dir(temp.path().join("blog")).unwrap();

        let mut config = test_config(temp.path(), &log, &["blog"]);
        config.manifest_command = "exit 7".to_string();

        let pipeline = Pipeline::with_features(config, Box::new(LogFeatures { log: log.clone() }));
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, PipelineError::Manifest(_)));
        assert!(read_log(&log).is_empty());
    }

    #[tokio::test]
    async fn root_build_failure_prevents_later_stages() {
        let temp = tempdir().unwrap();
        let log = temp.path().join("build.log");
        fs::create_dir(temp.path().join("blog")).unwrap();

        let mut config = test_config(temp.path(), &log, &["blog"]);
        config.build_command = "exit 1".to_string();

        let pipeline = Pipeline::with_features(config, Box::new(LogFeatures { log: log.clone() }));
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, PipelineError::RootBuild(_)));
        assert_eq!(read_log(&log), vec!["manifest".to_string()]);
    }

    #[tokio::test]
    async fn feature_failure_prevents_folder_builds() {
        let temp = tempdir().unwrap();
        let log = temp.path().join("build.log");
        fs::create_dir(temp.path().join("blog")).unwrap();

        let config = test_config(temp.path(), &log, &["blog"]);
        let pipeline = Pipeline::with_features(config, Box::new(FailingFeatures));
        let err = pipeline.run().await.unwrap_err();

        assert!(matches!(err, PipelineError::Features(_)));
        assert!(!read_log(&log).contains(&"build:blog".to_string()));
    }
}
