//! This file defines the common errors used by the relay server and its clients.

use core::result::Result as StdResult;
use thiserror::Error;
use warp::http::StatusCode;

/// A wrapper around Result<T, E> that pins this error type.
pub type Result<T> = StdResult<T, Error>;

#[derive(Debug, Error)]
#[error("{0}")]
/// A common error type used throughout the relay. Every variant is scoped to a
/// single request or session; none of them are fatal to the process except `Exited`.
pub enum Error {
    /// A generic connection error. Implies the client's stream is gone, either
    /// because it disconnected or because the transport failed mid-write.
    Connection(String),
    /// A message deserialization error. The request body was not a valid message.
    Deserialize(String),
    /// The target identity is not currently connected.
    NotFound(String),
    /// The transport cannot incrementally flush, so it cannot carry a stream.
    Unsupported(String),
    /// A generic parsing-related error. An example is a failed parse of a socket address.
    Parse(String),
    /// A long-running task exited when it was not supposed to.
    Exited(String),
}

impl Error {
    /// The HTTP status a caller should see for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Deserialize(_) | Self::NotFound(_) => StatusCode::BAD_REQUEST,
            Self::Connection(_) | Self::Unsupported(_) | Self::Parse(_) | Self::Exited(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[macro_export]
/// A macro that bails early using the specified error type and context.
/// Is semantically equivalent to `return Error::Type("context: {error}")`.
macro_rules! bail {
    ($expr: expr, $type: ident, $context: expr) => {
        $expr.map_err(|err| Error::$type(format!("{}: {err}", $context)))?
    };
}

/// The following is a macro that helps us parse socket addresses. We use it to
/// deduplicate code where we parse multiple addresses. It basically combines `.parse()`
/// and `bail!()`
#[macro_export]
macro_rules! parse_socket_address {
    ($address:expr) => {
        bail!($address.parse(), Parse, "failed to parse socket address")
    };
}
