//! The write/flush capability a client's open stream exposes, and the
//! channel-backed implementation we hand to HTTP response bodies.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::{Error, Result};

/// The `StreamSink` trait lets the registry and sessions be generic over whatever
/// the transport gives us, so long as it can be written to and flushed.
#[async_trait]
pub trait StreamSink: Send + Sync + 'static {
    /// Write bytes into the stream. They may be buffered until the next flush.
    ///
    /// # Errors
    /// If the remote side of the stream is gone
    async fn write(&self, bytes: &[u8]) -> Result<()>;

    /// Force any buffered bytes out to the transport immediately.
    ///
    /// # Errors
    /// If the remote side of the stream is gone
    async fn flush(&self) -> Result<()>;

    /// Whether or not this sink can flush incrementally. A sink that can't
    /// is useless for streaming.
    fn supports_flush(&self) -> bool {
        true
    }

    /// Resolves once the transport has closed the stream.
    async fn closed(&self);
}

/// A `StreamSink` that buffers writes and sends each flushed chunk down an
/// unbounded channel. The receiving half becomes the body of an HTTP response,
/// so the channel closes exactly when the transport drops the body.
pub struct ChannelSink {
    buffer: Mutex<BytesMut>,
    sender: UnboundedSender<Bytes>,
}

impl ChannelSink {
    /// Create a new sink along with the stream of chunks it flushes
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiverStream<Bytes>) {
        let (sender, receiver) = unbounded_channel();

        (
            Self {
                buffer: Mutex::new(BytesMut::new()),
                sender,
            },
            UnboundedReceiverStream::new(receiver),
        )
    }
}

#[async_trait]
impl StreamSink for ChannelSink {
    async fn write(&self, bytes: &[u8]) -> Result<()> {
        if self.sender.is_closed() {
            return Err(Error::Connection("stream closed".to_string()));
        }

        self.buffer.lock().extend_from_slice(bytes);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        // Take everything buffered so far, dropping the lock before sending
        let chunk = self.buffer.lock().split().freeze();
        if chunk.is_empty() {
            return Ok(());
        }

        self.sender
            .send(chunk)
            .map_err(|_| Error::Connection("stream closed".to_string()))
    }

    async fn closed(&self) {
        self.sender.closed().await;
    }
}
