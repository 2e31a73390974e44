//! Routing a one-off message into the open stream of the client it names.

use relay_proto::{
    error::{Error, Result},
    message::Message,
    mnemonic,
    sink::StreamSink,
};
use tracing::{debug, warn};

use crate::{metrics, registry::Registry};

/// Parse a message from a request body and write it into its target's stream.
/// Delivery is attempted exactly once. Nothing is queued or retried.
///
/// # Errors
/// - If the body is not a valid message. The registry is not consulted.
/// - If the target is not connected
/// - If the target disconnected between lookup and write
pub async fn dispatch<S: StreamSink>(registry: &Registry<S>, body: &[u8]) -> Result<()> {
    let message = Message::from_body(body)?;
    let recipient = message.recipient();

    // Find the target's stream. The registry lock is released before we write.
    let Some(sink) = registry.lookup(&recipient) else {
        metrics::NUM_MESSAGES_DROPPED.inc();
        return Err(Error::NotFound("To client not found".to_string()));
    };

    // Write the payload as a single line and push it out
    let delivered = async {
        sink.write(&message.to_line()).await?;
        sink.flush().await
    }
    .await;

    if let Err(err) = delivered {
        warn!(id = mnemonic(&recipient), "failed to deliver message: {err}");
        metrics::NUM_MESSAGES_DROPPED.inc();
        return Err(err);
    }

    debug!(id = mnemonic(&recipient), "delivered message");
    metrics::NUM_MESSAGES_DELIVERED.inc();

    Ok(())
}
