use crate::utils::*;
use huddle_core::HuddleError;
use huddle_peer::link::Role;
use huddle_peer::{PeerConfig, PlayerOrchestrator, SessionStatus, SignalingClient};
use std::time::Duration;

#[tokio::test]
async fn test_join_applies_host_answer() {
    init_tracing();

    let signaling = MockSignaling::player(JoinBehavior::Answer("answer:host".into()));
    let factory = MockLinkFactory::new();
    let room = signaling.room();

    let player = PlayerOrchestrator::join(
        PeerConfig::default(),
        signaling.clone(),
        factory.clone(),
        room,
    )
    .await
    .unwrap();

    let me = player.me();
    let link = factory.link_for(&me).unwrap();
    assert_eq!(link.role, Role::Player);
    assert_eq!(link.remote().as_deref(), Some("answer:host"));
    assert_eq!(
        signaling.calls(),
        vec![SignalCall::Join {
            room,
            sdp: format!("offer:{}", me)
        }]
    );

    let view = player.view();
    assert_eq!(view.borrow().status, SessionStatus::Connecting);
    assert!(view.borrow().player(&signaling.host_id()).is_some());
    assert!(view.borrow().player(&me).is_some());

    link.open();
    assert!(
        wait_until(WAIT_TIMEOUT_MS, || view.borrow().status == SessionStatus::Connected).await
    );
}

#[tokio::test]
async fn test_missing_answer_is_a_mismatch() {
    init_tracing();

    let signaling = MockSignaling::player(JoinBehavior::NoAnswer);
    let factory = MockLinkFactory::new();

    let result = PlayerOrchestrator::join(
        PeerConfig::default(),
        signaling.clone(),
        factory.clone(),
        signaling.room(),
    )
    .await;

    assert!(matches!(result, Err(HuddleError::NegotiationMismatch(_))));
    assert!(factory.link_for(&signaling.me()).unwrap().is_closed());
}

#[tokio::test]
async fn test_join_gives_up_after_timeout() {
    init_tracing();

    let signaling = MockSignaling::player(JoinBehavior::Hang);
    let factory = MockLinkFactory::new();
    let config = PeerConfig {
        join_timeout: Duration::from_millis(200),
        ..PeerConfig::default()
    };

    let result =
        PlayerOrchestrator::join(config, signaling.clone(), factory.clone(), signaling.room())
            .await;

    assert!(matches!(result, Err(HuddleError::RelayTimeout)));
    assert!(factory.link_for(&signaling.me()).unwrap().is_closed());
}
