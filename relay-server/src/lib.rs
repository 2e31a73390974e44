//! This file contains the implementation of the `Relay`, which keeps client
//! event streams open and routes one-off messages into them.

#![forbid(unsafe_code)]

mod dispatch;
mod metrics;
mod pages;
pub mod registry;
mod routes;
pub mod session;


use std::{
    future::Future,
    net::{Ipv4Addr, SocketAddr},
    pin::Pin,
    sync::Arc,
};

pub use dispatch::dispatch;
use derive_builder::Builder;
use registry::Registry;
use relay_proto::{
    bail,
    error::{Error, Result},
    metrics as proto_metrics, parse_socket_address,
    sink::ChannelSink,
};
use tokio::spawn;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The relay's configuration. We need this when we create a new one.
#[derive(Builder)]
pub struct Config {
    /// The address we accept client connections on
    #[builder(default = "String::from(\"0.0.0.0:8000\")")]
    pub bind_address: String,

    /// Whether or not we want to serve metrics
    #[builder(default = "false")]
    pub metrics_enabled: bool,

    /// The port we want to serve metrics on
    #[builder(default = "9090")]
    pub metrics_port: u16,

    /// The IP/interface we want to serve the metrics on
    #[builder(default = "String::from(\"127.0.0.1\")")]
    pub metrics_ip: String,
}

/// The relay `Inner` that we use to share common data between the routes and
/// every session task.
struct Inner {
    /// The clients that are currently connected. We use this everywhere we need
    /// to attach, detach, or deliver to a client.
    registry: Arc<Registry<ChannelSink>>,

    /// Cancelled when the relay shuts down. Every session observes it.
    shutdown: CancellationToken,
}

/// The main `Relay` struct. We instantiate this when we want to run a relay.
pub struct Relay {
    /// The relay's `Inner`. We clone this and pass it around when needed.
    inner: Arc<Inner>,

    /// The address we actually bound to
    local_address: SocketAddr,

    /// The bound HTTP server. It resolves once shutdown completes.
    server: Pin<Box<dyn Future<Output = ()> + Send>>,

    /// The address at which we serve metrics, or none at all if we aren't serving.
    metrics_bind_address: Option<SocketAddr>,
}

impl Relay {
    /// Create a new `Relay` from a `Config`, binding to its address.
    ///
    /// # Errors
    /// - If we fail to parse the bind or metrics address
    /// - If we fail to bind to the bind address
    pub async fn new(config: Config) -> Result<Self> {
        // Extrapolate values from the underlying relay configuration
        let Config {
            bind_address,
            metrics_enabled,
            metrics_port,
            metrics_ip,
        } = config;

        let bind_address: SocketAddr = parse_socket_address!(bind_address);

        let inner = Arc::new(Inner {
            registry: Arc::new(Registry::new()),
            shutdown: CancellationToken::new(),
        });

        // Bind now so callers learn about a taken port before starting
        let shutdown = inner.shutdown.clone();
        let (local_address, server) = bail!(
            warp::serve(routes::routes(inner.clone())).try_bind_with_graceful_shutdown(
                bind_address,
                async move { shutdown.cancelled().await }
            ),
            Connection,
            format!("failed to bind to address {bind_address}")
        );

        info!("listening for clients on {local_address}");

        // Parse the metrics IP and port
        let metrics_bind_address = if metrics_enabled {
            let ip: Ipv4Addr = parse_socket_address!(metrics_ip);
            Some(SocketAddr::from((ip, metrics_port)))
        } else {
            None
        };

        Ok(Self {
            inner,
            local_address,
            server: Box::pin(server),
            metrics_bind_address,
        })
    }

    /// The address the relay is listening on
    pub fn local_address(&self) -> SocketAddr {
        self.local_address
    }

    /// The relay's client registry
    pub fn registry(&self) -> Arc<Registry<ChannelSink>> {
        self.inner.registry.clone()
    }

    /// A token that shuts the relay down when cancelled. Every open session is
    /// detached and its stream ended.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// The main loop for a relay.
    /// Consumes self.
    ///
    /// # Errors
    /// If the server exits without having been asked to shut down
    pub async fn start(self) -> Result<()> {
        // Serve the (possible) metrics task
        if let Some(metrics_bind_address) = self.metrics_bind_address {
            spawn(proto_metrics::serve_metrics(metrics_bind_address));
        }

        self.server.await;

        if self.inner.shutdown.is_cancelled() {
            info!("relay shut down");
            Ok(())
        } else {
            Err(Error::Exited("relay server exited!".to_string()))
        }
    }
}
