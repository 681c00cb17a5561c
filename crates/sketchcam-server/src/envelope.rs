//! The JSON message wrapper exchanged over the socket.
//!
//! ```json
//! {"type": "img", "data": "data:image/png;base64,..."}
//! ```
//!
//! Clients send `img`; the server answers with `frame`. Any other
//! `type` is still a valid envelope and is parsed as [`Kind::Other`].

use serde::{Deserialize, Serialize};

/// Message kind carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A client-submitted frame.
    Img,
    /// A server-returned frame.
    Frame,
    /// Any other value; never triggers processing.
    #[default]
    #[serde(other)]
    Other,
}

/// One message on the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// What the payload is.
    #[serde(rename = "type", default)]
    pub kind: Kind,
    /// Data-URI payload. Empty when absent.
    #[serde(default)]
    pub data: String,
}

impl Envelope {
    /// Parse one inbound message body.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `bytes` is not a JSON object
    /// with string-valued fields.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Outbound envelope carrying an encoded frame.
    #[must_use]
    pub const fn frame(data: String) -> Self {
        Self {
            kind: Kind::Frame,
            data,
        }
    }

    /// Serialize to the JSON text sent on the socket.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
