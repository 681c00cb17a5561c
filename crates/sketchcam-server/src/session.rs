//! The per-connection processing loop.
//!
//! A session is a three-state machine:
//!
//! ```text
//!          img envelope
//!   Open ───────────────▶ Processing
//!    ▲ │                      │
//!    │ │ other envelope       │ frame sent
//!    └─┴──────────────────────┘
//!      │                      │
//!      │ end / error          │ error
//!      ▼                      ▼
//!   Closed ◀──────────────────┘
//! ```
//!
//! Every transition into [`SessionState::Closed`] carries a
//! [`CloseReason`]. Nothing is retried and no error is ever reported to
//! the client; the socket simply closes.
//!
//! Processing is strictly sequential. The next message is not read
//! until the current frame has been answered, which throttles a client
//! that sends faster than the pipeline runs.

use std::time::Duration;

use sketchcam_pipeline::{VariantKind, codec};
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::envelope::{Envelope, Kind};
use crate::error::SessionError;
use crate::transport::Transport;

/// Where a session is in its lifecycle.
#[derive(Debug)]
pub enum SessionState {
    /// Waiting for the next inbound message.
    Open,
    /// Handling one `img` payload.
    Processing(String),
    /// Terminal.
    Closed(CloseReason),
}

/// Why a session ended.
#[derive(Debug)]
pub enum CloseReason {
    /// The client closed the channel.
    ClientClosed,
    /// A message or frame failed; the server closed the channel.
    Failed(SessionError),
}

impl CloseReason {
    /// Whether the session ended without an error.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::ClientClosed)
    }
}

impl From<SessionError> for SessionState {
    fn from(err: SessionError) -> Self {
        Self::Closed(CloseReason::Failed(err))
    }
}

/// Drive one connection until it closes.
pub async fn run_session<T: Transport>(transport: &mut T, config: &ServerConfig) -> CloseReason {
    let mut state = SessionState::Open;
    loop {
        state = match state {
            SessionState::Open => receive(transport).await,
            SessionState::Processing(payload) => respond(transport, payload, config).await,
            SessionState::Closed(reason) => {
                if let CloseReason::Failed(ref err) = reason {
                    warn!(error = %err, "closing connection");
                }
                if let Err(e) = transport.close().await {
                    debug!(error = %e, "close handshake failed");
                }
                return reason;
            }
        };
    }
}

/// `Open`: read and classify one inbound message.
async fn receive<T: Transport>(transport: &mut T) -> SessionState {
    let bytes = match transport.next_message().await {
        None => return SessionState::Closed(CloseReason::ClientClosed),
        Some(Err(e)) => return SessionError::from(e).into(),
        Some(Ok(bytes)) => bytes,
    };
    match Envelope::parse(&bytes) {
        Err(e) => SessionError::from(e).into(),
        Ok(Envelope {
            kind: Kind::Img,
            data,
        }) => SessionState::Processing(data),
        Ok(Envelope { kind, .. }) => {
            debug!(?kind, "ignoring envelope");
            SessionState::Open
        }
    }
}

/// `Processing`: turn one payload into one `frame` reply.
async fn respond<T: Transport>(
    transport: &mut T,
    payload: String,
    config: &ServerConfig,
) -> SessionState {
    let reply = async {
        let data = process_frame(payload, config.variant, config.frame_timeout).await?;
        let text = Envelope::frame(data).to_json()?;
        transport.send_text(text).await?;
        Ok::<_, SessionError>(())
    };
    match reply.await {
        Ok(()) => SessionState::Open,
        Err(e) => e.into(),
    }
}

/// Decode `payload`, run `variant` over it and encode the result, on the
/// blocking pool and within `deadline`.
///
/// On timeout the worker is abandoned, not interrupted: it runs to
/// completion in the background and its result is dropped.
///
/// # Errors
///
/// Returns the decode, pipeline or encode failure, or
/// [`SessionError::Timeout`] if `deadline` passes first.
pub async fn process_frame(
    payload: String,
    variant: VariantKind,
    deadline: Duration,
) -> Result<String, SessionError> {
    let span = tracing::Span::current();
    let worker = tokio::task::spawn_blocking(move || {
        span.in_scope(|| transform_payload(&payload, variant))
    });
    match tokio::time::timeout(deadline, worker).await {
        Ok(joined) => joined?,
        Err(_) => Err(SessionError::Timeout(deadline)),
    }
}

fn transform_payload(payload: &str, variant: VariantKind) -> Result<String, SessionError> {
    let frame = codec::decode(payload)?;
    let (output, diagnostics) = variant.run_with_diagnostics(&frame)?;
    debug!(
        variant = variant.name(),
        width = diagnostics.input.width,
        height = diagnostics.input.height,
        total_us = diagnostics.total_duration.as_micros(),
        drawn = ?diagnostics.drawn_polygons(),
        "frame processed"
    );
    Ok(codec::encode(&output)?)
}
