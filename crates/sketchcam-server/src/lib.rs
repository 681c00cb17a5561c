//! sketchcam-server: WebSocket front end for the sketchcam pipeline.
//!
//! Each connection is served by its own task running
//! [`session::run_session`]: receive an `img` envelope, decode it, run
//! the configured variant, encode and answer with a `frame` envelope.
//! Any failure closes that connection and only that connection.

pub mod config;
pub mod envelope;
pub mod error;
pub mod server;
pub mod session;
pub mod transport;

pub use config::{Cli, ServerConfig};
pub use envelope::{Envelope, Kind};
pub use error::{ServerError, SessionError, TransportError};
pub use server::{router, serve};
pub use session::{CloseReason, SessionState, run_session};
pub use transport::Transport;
