use std::{net::SocketAddr, sync::Arc, time::Duration};

use relay_proto::{error::Result, identity::ClientIdentity, sink::ChannelSink};
use relay_server::{registry::Registry, ConfigBuilder, Relay};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    spawn,
    task::JoinHandle,
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

mod delivery;

/// A relay running in the background for the duration of a test
struct TestRelay {
    address: SocketAddr,
    registry: Arc<Registry<ChannelSink>>,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<()>>,
}

/// Create and start a new relay on a free local port
async fn new_relay() -> TestRelay {
    // Build the relay's config
    let config = ConfigBuilder::default()
        .bind_address("127.0.0.1:0".to_string())
        .build()
        .expect("failed to build relay config");

    // Create the relay
    let relay = Relay::new(config).await.expect("failed to create relay");

    TestRelay {
        address: relay.local_address(),
        registry: relay.registry(),
        shutdown: relay.shutdown_token(),
        handle: spawn(relay.start()),
    }
}

/// An open event stream, as seen from the client
struct TestStream {
    identity: String,
    connection: TcpStream,
    received: String,
}

impl TestStream {
    /// Read from the stream until `needle` shows up, panicking after a second
    async fn expect(&mut self, needle: &str) {
        let result = timeout(Duration::from_secs(1), async {
            let mut buffer = [0; 4096];
            while !self.received.contains(needle) {
                let read = self
                    .connection
                    .read(&mut buffer)
                    .await
                    .expect("failed to read from stream");
                assert!(read > 0, "stream closed before receiving {needle:?}");
                self.received
                    .push_str(&String::from_utf8_lossy(&buffer[..read]));
            }
        })
        .await;

        assert!(result.is_ok(), "timed out waiting for {needle:?}");
    }

    /// Wait for the relay to end the stream
    async fn expect_closed(&mut self) {
        let mut buffer = Vec::new();
        let result = timeout(
            Duration::from_secs(1),
            self.connection.read_to_end(&mut buffer),
        )
        .await;

        assert!(
            matches!(result, Ok(Ok(_))),
            "stream was not closed by the relay"
        );
    }
}

/// Open an event stream, optionally presenting an identity cookie, and wait
/// for the welcome line
async fn open_stream(address: SocketAddr, cookie: Option<&str>) -> TestStream {
    let mut connection = TcpStream::connect(address)
        .await
        .expect("failed to connect to relay");

    let cookie = cookie
        .map(|identity| format!("Cookie: sse_client_id={identity}\r\n"))
        .unwrap_or_default();
    connection
        .write_all(format!("GET /events HTTP/1.1\r\nHost: {address}\r\n{cookie}\r\n").as_bytes())
        .await
        .expect("failed to send request");

    let mut stream = TestStream {
        identity: String::new(),
        connection,
        received: String::new(),
    };
    stream.expect("Welcome to the event stream - ").await;

    // Pull our identity out of the cookie the relay set
    stream.identity = stream
        .received
        .split("set-cookie: sse_client_id=")
        .nth(1)
        .and_then(|rest| rest.split(';').next())
        .expect("relay did not set an identity cookie")
        .to_string();
    let welcome = format!("Welcome to the event stream - {}\n", stream.identity);
    stream.expect(&welcome).await;

    stream
}

/// Send a one-shot request and return its status code and body
async fn request(address: SocketAddr, method: &str, body: &str) -> (u16, String) {
    let mut connection = TcpStream::connect(address)
        .await
        .expect("failed to connect to relay");

    connection
        .write_all(
            format!(
                "{method} /events HTTP/1.1\r\nHost: {address}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .as_bytes(),
        )
        .await
        .expect("failed to send request");

    let mut response = String::new();
    timeout(
        Duration::from_secs(1),
        connection.read_to_string(&mut response),
    )
    .await
    .expect("timed out waiting for response")
    .expect("failed to read response");

    let status = response
        .split(' ')
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("response had no status code");
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();

    (status, body)
}

/// Post a message to the relay, returning the status code
async fn post_message(address: SocketAddr, message: &str, to: &str) -> u16 {
    request(
        address,
        "POST",
        &format!(r#"{{"message": "{message}", "to": "{to}"}}"#),
    )
    .await
    .0
}

/// Wait (up to a second) for a client to be registered or not
async fn wait_for_registration(
    registry: &Registry<ChannelSink>,
    identity: &str,
    registered: bool,
) -> bool {
    let identity = ClientIdentity::from(identity);
    for _ in 0..100 {
        if registry.lookup(&identity).is_some() == registered {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}
