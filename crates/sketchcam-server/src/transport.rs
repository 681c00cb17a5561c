//! The message channel a session runs over.
//!
//! [`run_session`](crate::session::run_session) only needs to pull the
//! next message body, push a text reply, and close. The axum
//! [`WebSocket`] is the production implementation; tests drive sessions
//! over in-memory channels.

use std::future::Future;

use axum::extract::ws::{Message, WebSocket};

use crate::error::TransportError;

/// A bidirectional, message-oriented client connection.
pub trait Transport: Send {
    /// Wait for the next application message body.
    ///
    /// Returns `None` once the peer has closed the channel. Control
    /// traffic (ping/pong) is handled by the implementation and never
    /// surfaces here.
    fn next_message(&mut self) -> impl Future<Output = Option<Result<Vec<u8>, TransportError>>> + Send;

    /// Send one text message.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close the channel from this side.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl Transport for WebSocket {
    async fn next_message(&mut self) -> Option<Result<Vec<u8>, TransportError>> {
        loop {
            let message = match self.recv().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TransportError::new(e))),
            };
            match message {
                Message::Text(text) => return Some(Ok(text.as_str().as_bytes().to_vec())),
                Message::Binary(bytes) => return Some(Ok(bytes.to_vec())),
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => return None,
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        WebSocket::send(self, Message::Text(text.into()))
            .await
            .map_err(TransportError::new)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        WebSocket::send(self, Message::Close(None))
            .await
            .map_err(TransportError::new)
    }
}
