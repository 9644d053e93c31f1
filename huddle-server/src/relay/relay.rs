use crate::relay::subscription::{Listener, Subscription};
use dashmap::DashMap;
use huddle_core::{ChannelName, HuddleError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// The single active subscriber of a channel.
enum Slot {
    /// Consumed by the first payload.
    Once {
        token: u64,
        tx: oneshot::Sender<String>,
    },
    /// Receives every payload until the listener is dropped.
    Stream {
        token: u64,
        tx: mpsc::UnboundedSender<String>,
    },
}

impl Slot {
    fn token(&self) -> u64 {
        match self {
            Slot::Once { token, .. } | Slot::Stream { token, .. } => *token,
        }
    }
}

struct RelayInner {
    channels: DashMap<ChannelName, Slot>,
    next_token: AtomicU64,
    closed: AtomicBool,
}

/// In-process publish/subscribe fabric for negotiation payloads.
///
/// Delivery is at-most-once and best-effort: a payload published on a channel
/// nobody listens to is dropped. Each channel has at most one subscriber; a
/// new subscription displaces the previous one.
#[derive(Clone)]
pub struct SignalingRelay {
    inner: Arc<RelayInner>,
}

impl SignalingRelay {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                channels: DashMap::new(),
                next_token: AtomicU64::new(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Fire-and-forget. Returns whether a subscriber took the payload.
    pub fn publish(&self, channel: &ChannelName, payload: impl Into<String>) -> bool {
        let payload = payload.into();

        if let Some((_, Slot::Once { tx, .. })) = self
            .inner
            .channels
            .remove_if(channel, |_, slot| matches!(slot, Slot::Once { .. }))
        {
            if tx.send(payload).is_ok() {
                debug!("Delivered one-shot payload on {}", channel);
                return true;
            }
            debug!("Subscriber on {} went away before delivery", channel);
            return false;
        }

        let stale = match self.inner.channels.get(channel) {
            Some(slot) => match slot.value() {
                Slot::Stream { token, tx } => match tx.send(payload) {
                    Ok(()) => {
                        debug!("Delivered payload to listener on {}", channel);
                        return true;
                    }
                    Err(_) => Some(*token),
                },
                Slot::Once { .. } => None,
            },
            None => None,
        };

        if let Some(token) = stale {
            self.release(channel, token);
        }

        debug!("No subscriber on {}, payload dropped", channel);
        false
    }

    /// Waits for exactly one payload on `channel`. Dropping the returned
    /// subscription releases the channel.
    pub fn subscribe_once(&self, channel: ChannelName) -> Result<Subscription> {
        let (tx, rx) = oneshot::channel();
        let token = self.register(&channel, |token| Slot::Once { token, tx })?;
        Ok(Subscription::new(self.clone(), channel, token, rx))
    }

    /// Receives every payload on `channel` until the listener is dropped.
    pub fn listen(&self, channel: ChannelName) -> Result<Listener> {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = self.register(&channel, |token| Slot::Stream { token, tx })?;
        Ok(Listener::new(self.clone(), channel, token, rx))
    }

    pub fn is_subscribed(&self, channel: &ChannelName) -> bool {
        self.inner.channels.contains_key(channel)
    }

    /// Drops every subscription; pending waiters fail with `RelayUnavailable`.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.channels.clear();
    }

    fn register(&self, channel: &ChannelName, slot: impl FnOnce(u64) -> Slot) -> Result<u64> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(HuddleError::RelayUnavailable);
        }

        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        if self
            .inner
            .channels
            .insert(channel.clone(), slot(token))
            .is_some()
        {
            warn!("Subscription on {} displaced an earlier one", channel);
        }
        Ok(token)
    }

    /// Removes the slot only if it still belongs to `token`.
    pub(crate) fn release(&self, channel: &ChannelName, token: u64) {
        if self
            .inner
            .channels
            .remove_if(channel, |_, slot| slot.token() == token)
            .is_some()
        {
            debug!("Released {}", channel);
        }
    }
}

impl Default for SignalingRelay {
    fn default() -> Self {
        Self::new()
    }
}
