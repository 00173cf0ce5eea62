//! scrollwright CLI - builds a scroll-based site in dependency order.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use scrollwright_pipeline::{FolderStatus, Pipeline, PipelineConfig};
use scrollwright_server::{PreviewServer, PreviewServerConfig};

#[derive(Parser)]
#[command(name = "scrollwright")]
#[command(about = "Build a scroll-based site in dependency order")]
#[command(version)]
pub struct Cli {
    /// Start a local server after building
    #[arg(short, long)]
    serve: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = run(&cli).await {
        tracing::error!("build failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let root = std::env::current_dir()?;

    let config = PipelineConfig::for_root(&root);
    let report = Pipeline::new(config).run().await?;

    for outcome in report.failures() {
        if let FolderStatus::Failed(reason) = &outcome.status {
            tracing::warn!("{}/ finished with errors: {reason}", outcome.folder);
        }
    }

    tracing::info!(
        "build complete in {:.1}s",
        report.duration_ms as f64 / 1000.0
    );

    if cli.serve {
        PreviewServer::new(PreviewServerConfig {
            dir: root,
            ..Default::default()
        })
        .start()
        .await?;
    } else {
        tracing::info!("run with --serve to preview the site locally");
    }

    Ok(())
}
