//! The following is the main `Relay` binary, which just instantiates and runs
//! a `Relay` object.

use clap::Parser;
use relay_proto::{
    bail,
    error::{Error, Result},
};
use relay_server::{ConfigBuilder, Relay};
use tokio::{signal::ctrl_c, spawn};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
/// A relay that keeps client event streams open and routes messages into them.
struct Args {
    /// The IP to bind to for connections from clients
    #[arg(long, default_value = "0.0.0.0")]
    bind_ip: String,

    /// The port to bind to for connections from clients
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Whether or not metric collection and serving is enabled
    #[arg(long, default_value_t = false)]
    metrics_enabled: bool,

    /// The IP to bind to for externalizing metrics
    #[arg(long, default_value = "127.0.0.1")]
    metrics_ip: String,

    /// The port to bind to for externalizing metrics
    #[arg(long, default_value_t = 9090)]
    metrics_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // If we aren't on `tokio_unstable`, use the normal logger
    #[cfg(not(tokio_unstable))]
    if std::env::var("RUST_LOG_FORMAT") == Ok("json".to_string()) {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    }

    // If we are using the `tokio_unstable` feature, use the console logger
    #[cfg(tokio_unstable)]
    console_subscriber::init();

    // Create config
    let config = bail!(
        ConfigBuilder::default()
            .bind_address(format!("{}:{}", args.bind_ip, args.port))
            .metrics_enabled(args.metrics_enabled)
            .metrics_ip(args.metrics_ip)
            .metrics_port(args.metrics_port)
            .build(),
        Parse,
        "failed to build relay configuration"
    );

    // Create new `Relay`
    let relay = Relay::new(config).await?;
    info!("relay started on port {}", relay.local_address().port());

    // Shut down (detaching every client) on Ctrl-C
    let shutdown = relay.shutdown_token();
    spawn(async move {
        if let Err(err) = ctrl_c().await {
            error!("failed to listen for shutdown signal: {err}");
            return;
        }
        shutdown.cancel();
    });

    // Start the main loop, consuming it
    relay.start().await?;

    Ok(())
}
