//! Preview server implementation.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use tower_http::services::ServeDir;

/// Configuration for the preview server.
#[derive(Debug, Clone)]
pub struct PreviewServerConfig {
    /// Directory to serve
    pub dir: PathBuf,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for PreviewServerConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            port: 3000,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("directory not found: {}", .0.display())]
    MissingDir(PathBuf),

    #[error("invalid address {0}: {1}")]
    Addr(String, String),

    #[error("failed to bind to {0}: {1}")]
    Bind(SocketAddr, String),
}

/// Static preview server.
pub struct PreviewServer {
    config: PreviewServerConfig,
}

impl PreviewServer {
    /// Create a new preview server.
    pub fn new(config: PreviewServerConfig) -> Self {
        Self { config }
    }

    /// Serve the configured directory until externally interrupted.
    pub async fn start(self) -> Result<(), ServerError> {
        if !self.config.dir.exists() {
            return Err(ServerError::MissingDir(self.config.dir));
        }

        let raw_addr = format!("{}:{}", self.config.host, self.config.port);
        let addr: SocketAddr = raw_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ServerError::Addr(raw_addr, e.to_string()))?;

        let app = Router::new().fallback_service(ServeDir::new(&self.config.dir));

        tracing::info!("serving {} at http://{}", self.config.dir.display(), addr);
        tracing::info!("press Ctrl+C to stop");

        if self.config.open {
            let _ = open::that(format!("http://{}", addr));
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Bind(addr, e.to_string()))?;

        Ok(())
    }
}
