use huddle_core::{ChannelName, HuddleError, UserId};
use huddle_server::SignalingRelay;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_wait_times_out() {
    let relay = SignalingRelay::new();
    let channel = ChannelName::answer(&UserId::new());

    let subscription = relay.subscribe_once(channel.clone()).unwrap();
    let result = subscription.recv_timeout(Duration::from_secs(30)).await;

    assert!(matches!(result, Err(HuddleError::RelayTimeout)));
    assert!(!relay.is_subscribed(&channel));
}
