//! This module defines the connection registry: the map from a client's identity
//! to its live, writable stream.

use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use relay_proto::{identity::ClientIdentity, sink::StreamSink};

/// A concurrency-safe mapping from client identity to an open stream.
///
/// The whole map sits behind one mutex. Critical sections only ever insert,
/// remove, or clone an `Arc`; writes and flushes happen after the lock is released.
pub struct Registry<S: StreamSink> {
    entries: Mutex<HashMap<ClientIdentity, Arc<S>>>,
}

impl<S: StreamSink> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StreamSink> Registry<S> {
    /// Create a new, empty `Registry`
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Insert the entry for `identity`, replacing any existing one. The replaced
    /// entry is returned but not closed: its connection stays open, orphaned.
    pub fn register(&self, identity: ClientIdentity, entry: Arc<S>) -> Option<Arc<S>> {
        self.entries.lock().insert(identity, entry)
    }

    /// Remove the entry for `identity`. Removing an identity that isn't
    /// registered is a no-op, since disconnects can race.
    pub fn unregister(&self, identity: &ClientIdentity) -> Option<Arc<S>> {
        self.entries.lock().remove(identity)
    }

    /// Get a handle to the entry for `identity`, if one is registered
    pub fn lookup(&self, identity: &ClientIdentity) -> Option<Arc<S>> {
        self.entries.lock().get(identity).cloned()
    }

    /// Get the number of clients registered at any given time.
    pub fn num_clients(&self) -> usize {
        self.entries.lock().len()
    }
}
