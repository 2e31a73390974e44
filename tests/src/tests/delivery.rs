//! Tests for delivering messages to clients over a real connection.

use super::*;

/// This test tests that:
/// 1. Two clients get distinct identities
/// 2. A message posted to one of them is delivered to that one only
#[tokio::test]
async fn test_direct_delivery() {
    let relay = new_relay().await;

    let mut client1 = open_stream(relay.address, None).await;
    let mut client2 = open_stream(relay.address, None).await;
    assert_ne!(client1.identity, client2.identity);

    // Send a message to the first client
    assert_eq!(
        post_message(relay.address, "hello direct", &client1.identity).await,
        200
    );
    client1.expect("hello direct\n").await;

    // Then one to the second
    assert_eq!(
        post_message(relay.address, "hello again", &client2.identity).await,
        200
    );
    client2.expect("hello again\n").await;

    assert!(!client2.received.contains("hello direct"));
    assert!(!client1.received.contains("hello again"));
}

/// Messages to nobody, malformed messages, and other methods are rejected
#[tokio::test]
async fn test_rejections() {
    let relay = new_relay().await;

    assert_eq!(post_message(relay.address, "hi", "ghost").await, 400);

    let (status, body) = request(relay.address, "POST", "not json").await;
    assert_eq!(status, 400);
    assert!(body.contains("invalid JSON"));

    let (status, _) = request(relay.address, "PUT", "").await;
    assert_eq!(status, 405);
}

/// A client presenting its cookie again keeps its identity and keeps
/// receiving messages addressed to it
#[tokio::test]
async fn test_returning_client() {
    let relay = new_relay().await;

    let client = open_stream(relay.address, None).await;
    let identity = client.identity.clone();
    drop(client);
    assert!(wait_for_registration(&relay.registry, &identity, false).await);

    let mut client = open_stream(relay.address, Some(&identity)).await;
    assert_eq!(client.identity, identity);

    assert_eq!(post_message(relay.address, "welcome back", &identity).await, 200);
    client.expect("welcome back\n").await;
}
