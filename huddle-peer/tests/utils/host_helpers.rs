use super::{MockLink, MockLinkFactory, MockSignaling, WAIT_TIMEOUT_MS, wait_until};
use huddle_core::UserId;
use huddle_peer::{HostHandle, HostOrchestrator, PeerConfig};
use std::sync::Arc;

pub struct HostFixture {
    pub host: HostHandle,
    pub signaling: Arc<MockSignaling>,
    pub factory: Arc<MockLinkFactory>,
}

impl HostFixture {
    pub async fn start() -> Self {
        let signaling = MockSignaling::host();
        let factory = MockLinkFactory::new();
        let host = HostOrchestrator::start(PeerConfig::default(), signaling.clone(), factory.clone())
            .await
            .expect("Host failed to start");

        Self {
            host,
            signaling,
            factory,
        }
    }

    /// Offers, waits for the answer, then opens the channel and waits until
    /// the host lists the player.
    pub async fn connect(&self) -> (UserId, Arc<MockLink>) {
        let player = UserId::new();
        let link = self.negotiate(player).await;

        link.open();
        let view = self.host.view();
        assert!(
            wait_until(WAIT_TIMEOUT_MS, || view.borrow().player(&player).is_some()).await,
            "Host never listed {}",
            player
        );
        (player, link)
    }

    /// Offers and waits for the answer without opening the channel.
    pub async fn negotiate(&self, player: UserId) -> Arc<MockLink> {
        self.signaling.offer(player, format!("offer:{}", player));
        assert!(
            wait_until(WAIT_TIMEOUT_MS, || self.signaling.answers_for(&player) == 1).await,
            "No answer for {}",
            player
        );
        self.factory
            .link_for(&player)
            .expect("Answer sent without a link")
    }
}
