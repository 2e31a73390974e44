//! This crate defines the common code structures shared by the relay server,
//! its binaries, and its tests: identities, messages, and stream sinks.

#![forbid(unsafe_code)]

use std::hash::{Hash, Hasher};

pub mod error;
pub mod identity;
pub mod message;
pub mod sink;

#[cfg(feature = "metrics")]
pub mod metrics;

/// A function for generating a cute little client mnemonic from a hashable value.
/// Identities are long and random; this makes them easier to follow in logs.
#[must_use]
pub fn mnemonic<H: Hash>(value: H) -> String {
    let mut state = std::collections::hash_map::DefaultHasher::new();
    value.hash(&mut state);
    mnemonic::to_string(state.finish().to_le_bytes())
}
