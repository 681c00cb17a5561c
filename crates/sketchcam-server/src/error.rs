//! Error types for the server and its connections.

use std::net::SocketAddr;
use std::time::Duration;

use sketchcam_pipeline::{DecodeError, EncodeError, PipelineError};

/// A read or write failure on a client's socket.
#[derive(Debug, thiserror::Error)]
#[error("transport error: {0}")]
pub struct TransportError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    /// Wrap any transport-level error.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

/// Why a connection left the processing loop. Every variant is terminal.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The inbound message was not a valid envelope.
    #[error("malformed envelope: {0}")]
    EnvelopeParse(#[from] serde_json::Error),

    /// The `img` payload could not be decoded into a frame.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A pipeline stage rejected its input.
    #[error("pipeline failed: {0}")]
    Pipeline(#[from] PipelineError),

    /// The output frame could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Reading from or writing to the socket failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Processing one frame took longer than the configured deadline.
    #[error("frame processing exceeded {0:?}")]
    Timeout(Duration),

    /// The processing task panicked or was cancelled.
    #[error("frame worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Fatal server-level errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("server failed: {0}")]
    Serve(#[source] std::io::Error),
}
