//! Build pipeline for scroll-based static sites.
//!
//! The pipeline shells out to the scroll CLI in a fixed folder order, applies
//! a Windows compatibility patch to the CLI's parser sources, generates
//! derived feature pages from the root build's `measures.json` artifact, and
//! reports a per-folder outcome for every configured subfolder.

pub mod features;
pub mod patcher;
pub mod pipeline;
pub mod runner;

pub use features::{FeatureError, FeaturePages, MeasureTables};
pub use patcher::{PatchError, PatchOutcome, PatchSummary};
pub use pipeline::{
    BuildReport, FolderOutcome, FolderStatus, Pipeline, PipelineConfig, PipelineError,
};
pub use runner::{run_command, CommandError, Verbosity};
