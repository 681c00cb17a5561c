//! Command-line and environment configuration.
//!
//! Every flag has an environment fallback so the server can be
//! configured from a container manifest without a wrapper script. The
//! parsed [`Cli`] is turned into an immutable [`ServerConfig`] once at
//! startup and shared read-only between connections.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use sketchcam_pipeline::VariantKind;

/// Real-time frame processing over WebSocket.
///
/// Every `img` message received on `/` is decoded, run through the
/// configured pipeline variant, and answered with a `frame` message.
#[derive(Debug, Parser)]
#[command(name = "sketchcam-server", version)]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, env = "SKETCHCAM_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Pipeline variant applied to every frame.
    #[arg(long, env = "SKETCHCAM_VARIANT", value_enum, default_value_t = Variant::Shapes)]
    pub variant: Variant,

    /// Per-frame processing deadline in milliseconds. A frame that takes
    /// longer closes its connection.
    #[arg(
        long,
        env = "SKETCHCAM_FRAME_TIMEOUT_MS",
        default_value_t = 5000,
        value_parser = clap::builder::RangedU64ValueParser::<u64>::new().range(1..),
    )]
    pub frame_timeout_ms: u64,
}

/// Pipeline variant selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Variant {
    /// Binary line drawing of the frame's edges.
    Sketch,
    /// Detected triangles filled in red on the original frame.
    Shapes,
}

impl From<Variant> for VariantKind {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Sketch => Self::Sketch,
            Variant::Shapes => Self::ShapeDetect,
        }
    }
}

/// Immutable server configuration, established once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub listen: SocketAddr,
    /// Variant every connection runs.
    pub variant: VariantKind,
    /// Deadline for decoding, processing and encoding one frame.
    pub frame_timeout: Duration,
}

impl ServerConfig {
    /// Default per-frame deadline.
    pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

    /// Config for `variant` with every other field at its default.
    #[must_use]
    pub fn with_variant(variant: VariantKind) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            variant: VariantKind::default(),
            frame_timeout: Self::DEFAULT_FRAME_TIMEOUT,
        }
    }
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            listen: cli.listen,
            variant: cli.variant.into(),
            frame_timeout: Duration::from_millis(cli.frame_timeout_ms),
        }
    }
}
