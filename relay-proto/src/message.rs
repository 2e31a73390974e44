//! The message a sender asks us to route to a connected client.

use serde::Deserialize;

use crate::{
    bail,
    error::{Error, Result},
    identity::ClientIdentity,
};

/// A one-off message for a single client. It is never stored: it is read from
/// the request, written once into the target's stream, and dropped.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Message {
    /// The payload to write into the target's stream
    pub message: String,
    /// The identity of the target client
    pub to: String,
}

impl Message {
    /// Deserialize a message from a JSON request body
    ///
    /// # Errors
    /// If the body is not a JSON object with string `message` and `to` fields
    pub fn from_body(body: &[u8]) -> Result<Self> {
        Ok(bail!(
            serde_json::from_slice::<Self>(body),
            Deserialize,
            "invalid JSON"
        ))
    }

    /// The identity this message is addressed to
    #[must_use]
    pub fn recipient(&self) -> ClientIdentity {
        ClientIdentity::from(self.to.as_str())
    }

    /// The bytes written into the target's stream: the payload followed by a
    /// line separator, with no other framing or escaping.
    #[must_use]
    pub fn to_line(&self) -> Vec<u8> {
        let mut line = Vec::with_capacity(self.message.len() + 1);
        line.extend_from_slice(self.message.as_bytes());
        line.push(b'\n');
        line
    }
}
