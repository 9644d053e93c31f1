use crate::relay::SignalingRelay;
use futures::Stream;
use huddle_core::{ChannelName, HuddleError, Result};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Pending one-shot wait. Releases its channel when dropped, so a request
/// that is aborted mid-wait leaves nothing behind.
pub struct Subscription {
    relay: SignalingRelay,
    channel: ChannelName,
    token: u64,
    rx: oneshot::Receiver<String>,
}

impl Subscription {
    pub(crate) fn new(
        relay: SignalingRelay,
        channel: ChannelName,
        token: u64,
        rx: oneshot::Receiver<String>,
    ) -> Self {
        Self {
            relay,
            channel,
            token,
            rx,
        }
    }

    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    pub async fn recv(mut self) -> Result<String> {
        (&mut self.rx)
            .await
            .map_err(|_| HuddleError::RelayUnavailable)
    }

    pub async fn recv_timeout(self, timeout: Duration) -> Result<String> {
        tokio::time::timeout(timeout, self.recv())
            .await
            .map_err(|_| HuddleError::RelayTimeout)?
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.relay.release(&self.channel, self.token);
    }
}

/// Long-lived subscription used by a host waiting for join offers.
pub struct Listener {
    relay: SignalingRelay,
    channel: ChannelName,
    token: u64,
    rx: mpsc::UnboundedReceiver<String>,
}

impl Listener {
    pub(crate) fn new(
        relay: SignalingRelay,
        channel: ChannelName,
        token: u64,
        rx: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        Self {
            relay,
            channel,
            token,
            rx,
        }
    }

    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    /// `None` once the relay has dropped this listener.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    pub fn into_stream(self) -> impl Stream<Item = String> + Send {
        futures::stream::unfold(self, |mut listener| async move {
            listener.recv().await.map(|payload| (payload, listener))
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.relay.release(&self.channel, self.token);
    }
}
