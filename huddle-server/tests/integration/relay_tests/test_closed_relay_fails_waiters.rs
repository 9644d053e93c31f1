use huddle_core::{ChannelName, HuddleError, RoomId};
use huddle_server::SignalingRelay;

#[tokio::test]
async fn test_closed_relay_fails_waiters() {
    let relay = SignalingRelay::new();
    let channel = ChannelName::room(&RoomId::new());

    let pending = relay.subscribe_once(channel.clone()).unwrap();
    relay.close();

    assert!(matches!(pending.recv().await, Err(HuddleError::RelayUnavailable)));
    assert!(matches!(
        relay.subscribe_once(channel.clone()),
        Err(HuddleError::RelayUnavailable)
    ));
    assert!(relay.listen(channel).is_err());
}
