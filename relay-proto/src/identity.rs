//! Client identities and the resolver that establishes them from a request.

use std::time::Duration;

use derive_more::{Deref, Display, From};
use uuid::Uuid;

/// The name of the cookie that carries a client's identity between requests
pub const IDENTITY_COOKIE: &str = "sse_client_id";

/// How long a client should hold on to its identity cookie
pub const IDENTITY_COOKIE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// An opaque, globally unique token identifying one logical client.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deref, Display, From)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Mint a fresh identity. Collisions are treated as impossible.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// View the identity as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientIdentity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The outcome of resolving a request's identity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    /// The identity of the requester
    pub identity: ClientIdentity,
    /// Whether or not the identity was minted just now
    pub minted: bool,
}

/// Derive the requester's identity from the (optional) token it presented.
/// A presented token is returned unchanged, otherwise a new one is generated.
/// This never touches the registry.
#[must_use]
pub fn resolve(presented: Option<String>) -> Resolved {
    match presented {
        Some(token) if !token.is_empty() => Resolved {
            identity: ClientIdentity(token),
            minted: false,
        },
        _ => Resolved {
            identity: ClientIdentity::generate(),
            minted: true,
        },
    }
}

/// Build the `Set-Cookie` value instructing a client to persist its identity.
/// It is scoped to the whole service, hidden from scripts, and not restricted
/// to secure transports.
#[must_use]
pub fn persistence_cookie(identity: &ClientIdentity) -> String {
    format!(
        "{IDENTITY_COOKIE}={identity}; Path=/; Max-Age={}; HttpOnly",
        IDENTITY_COOKIE_TTL.as_secs()
    )
}
