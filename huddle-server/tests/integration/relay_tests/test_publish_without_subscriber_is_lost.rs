use huddle_core::{ChannelName, RoomId};
use huddle_server::SignalingRelay;

use crate::utils::init_tracing;

#[tokio::test]
async fn test_publish_without_subscriber_is_lost() {
    init_tracing();

    let relay = SignalingRelay::new();
    let channel = ChannelName::room(&RoomId::new());

    assert!(!relay.publish(&channel, "early"), "Nobody should take it");

    let subscription = relay.subscribe_once(channel.clone()).unwrap();
    assert!(relay.publish(&channel, "late"));
    assert_eq!(subscription.recv().await.unwrap(), "late");

    // One-shot: the channel is free again.
    assert!(!relay.is_subscribed(&channel));
    assert!(!relay.publish(&channel, "after"));
}
