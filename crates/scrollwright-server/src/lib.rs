//! Static preview server for built scroll sites.

mod server;

pub use server::{PreviewServer, PreviewServerConfig, ServerError};
