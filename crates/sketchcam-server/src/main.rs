//! sketchcam-server binary.
//!
//! # Usage
//!
//! ```text
//! sketchcam-server [--listen ADDR] [--variant sketch|shapes] [--frame-timeout-ms MS]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::process::ExitCode;

use clap::Parser;
use sketchcam_server::{Cli, ServerConfig, serve};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from(Cli::parse());
    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server exited");
            ExitCode::FAILURE
        }
    }
}
