//! This file defines the lifecycle of one client's open stream: attaching it to
//! the registry, waiting for the transport to close, and detaching it again.

use std::sync::Arc;

use relay_proto::{
    error::{Error, Result},
    identity::ClientIdentity,
    mnemonic,
    sink::StreamSink,
};
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{metrics, registry::Registry};

/// The states a session moves through, in order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Opening,
    Attached,
    Closed,
}

/// Removes a client from the registry when dropped. Holding one of these is what
/// it means to be attached, so cleanup runs on every exit path, including
/// task aborts and panics.
struct RegistrationGuard<S: StreamSink> {
    registry: Arc<Registry<S>>,
    identity: ClientIdentity,
}

impl<S: StreamSink> Drop for RegistrationGuard<S> {
    fn drop(&mut self) {
        // TODO: only remove the entry if it is still ours, once duplicate
        // connections for one identity are rejected or closed
        self.registry.unregister(&self.identity);
        metrics::NUM_CLIENTS_CONNECTED.dec();
    }
}

/// One client's open connection, from registration to deregistration.
pub struct Session<S: StreamSink> {
    identity: ClientIdentity,
    sink: Arc<S>,
    registry: Arc<Registry<S>>,

    state: SessionState,
    guard: Option<RegistrationGuard<S>>,
}

impl<S: StreamSink> Session<S> {
    /// Create a new session in the `Opening` state
    pub fn new(identity: ClientIdentity, sink: Arc<S>, registry: Arc<Registry<S>>) -> Self {
        Self {
            identity,
            sink,
            registry,
            state: SessionState::Opening,
            guard: None,
        }
    }

    /// The identity this session was opened for
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    /// The state the session is currently in
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Register the stream and send the welcome line.
    ///
    /// # Errors
    /// - If the sink cannot flush incrementally. Nothing is registered.
    /// - If the welcome line could not be written. The registration is undone.
    pub async fn attach(&mut self) -> Result<()> {
        if !self.sink.supports_flush() {
            return Err(Error::Unsupported("Streaming unsupported".to_string()));
        }

        // Add our client, replacing the old one if it exists
        self.registry.register(self.identity.clone(), self.sink.clone());
        metrics::NUM_CLIENTS_CONNECTED.inc();
        self.guard = Some(RegistrationGuard {
            registry: self.registry.clone(),
            identity: self.identity.clone(),
        });
        self.state = SessionState::Attached;

        info!(id = mnemonic(&self.identity), identity = %self.identity, "client attached");

        // Greet the client. If this fails, the guard detaches us when we're dropped
        self.sink
            .write(format!("Welcome to the event stream - {}\n", self.identity).as_bytes())
            .await?;
        self.sink.flush().await
    }

    /// Wait until either the transport closes the stream or the relay shuts down,
    /// then remove the client from the registry.
    pub async fn run_until_closed(mut self, shutdown: CancellationToken) {
        if self.state == SessionState::Attached {
            select! {
                () = self.sink.closed() => {
                    debug!(id = mnemonic(&self.identity), "transport closed");
                }
                () = shutdown.cancelled() => {
                    debug!(id = mnemonic(&self.identity), "relay shutting down");
                }
            }
        }

        self.close();
    }

    /// Detach from the registry. Closing twice is harmless.
    pub fn close(&mut self) {
        if let Some(guard) = self.guard.take() {
            drop(guard);
            info!(id = mnemonic(&self.identity), identity = %self.identity, "client detached");
        }
        self.state = SessionState::Closed;
    }
}
