use huddle_core::{ChannelName, UserId};
use huddle_server::SignalingRelay;

use crate::utils::init_tracing;

#[tokio::test]
async fn test_cancelled_wait_releases_channel() {
    init_tracing();

    let relay = SignalingRelay::new();
    let channel = ChannelName::answer(&UserId::new());

    let subscription = relay.subscribe_once(channel.clone()).unwrap();
    assert!(relay.is_subscribed(&channel));

    let waiter = tokio::spawn(async move { subscription.recv().await });
    tokio::task::yield_now().await;
    waiter.abort();
    assert!(waiter.await.unwrap_err().is_cancelled());

    assert!(!relay.is_subscribed(&channel));
    assert!(!relay.publish(&channel, "ANSWER"), "Publish should be a no-op");
}
