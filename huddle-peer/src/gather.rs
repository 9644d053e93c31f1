//! Deciding when a local description is worth publishing.
//!
//! The transport's explicit "gathering complete" signal wins whenever it shows
//! up. Without it we fall back to a debounce that starts on entry: once no
//! candidate has arrived for the quiet period the blob is published as is. Under slow networks the
//! debounce can fire before the last candidate, producing an incomplete blob.

use crate::link::GatherSignal;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// The transport reported gathering complete.
    Complete,
    /// No new candidate for the quiet period.
    Quiet,
    /// Gave up at the cap.
    Capped,
}

pub async fn settle(
    signals: &mut mpsc::UnboundedReceiver<GatherSignal>,
    quiet_period: Duration,
    cap: Duration,
) -> Settled {
    let started = Instant::now();
    let deadline = started + cap;
    let mut quiet_until = started + quiet_period;
    let mut candidates = 0usize;

    loop {
        match timeout_at(quiet_until.min(deadline), signals.recv()).await {
            Ok(Some(GatherSignal::Candidate)) => {
                candidates += 1;
                quiet_until = Instant::now() + quiet_period;
            }
            // A closed signal channel means nothing more can arrive.
            Ok(Some(GatherSignal::Complete)) | Ok(None) => {
                debug!("Gathering complete after {} candidates", candidates);
                return Settled::Complete;
            }
            Err(_) => {
                let settled = if quiet_until <= deadline {
                    Settled::Quiet
                } else {
                    Settled::Capped
                };
                debug!("Gathering {:?} after {} candidates", settled, candidates);
                return settled;
            }
        }
    }
}
