//! Output sinks for per-cycle mining events
//!
//! The scheduler calls [`EventSink::on_cycle`] synchronously after every
//! cycle, from its own task. Sinks must therefore return quickly; anything
//! slow belongs on the other side of a [`ChannelSink`].

use crate::types::MiningEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Receiver of mining cycle results
pub trait EventSink: Send + Sync {
    /// Called once per completed cycle, in cycle order
    fn on_cycle(&self, event: &MiningEvent);
}

impl<F> EventSink for F
where
    F: Fn(&MiningEvent) + Send + Sync,
{
    fn on_cycle(&self, event: &MiningEvent) {
        self(event)
    }
}

/// Forwards events over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<MiningEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MiningEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl From<mpsc::UnboundedSender<MiningEvent>> for ChannelSink {
    fn from(tx: mpsc::UnboundedSender<MiningEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn on_cycle(&self, event: &MiningEvent) {
        if self.tx.send(event.clone()).is_err() {
            warn!(nonce = event.nonce, "Event receiver dropped, discarding cycle result");
        }
    }
}

/// Records every event in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<MiningEvent>>>,
}

impl MemorySink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    pub fn events(&self) -> Vec<MiningEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Most recent event
    pub fn last(&self) -> Option<MiningEvent> {
        self.events.lock().last().cloned()
    }
}

impl EventSink for MemorySink {
    fn on_cycle(&self, event: &MiningEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Logs each event at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_cycle(&self, event: &MiningEvent) {
        info!(
            nonce = event.nonce,
            timestamp = %event.timestamp_display,
            hash = %event.digest,
            "Hash cycle"
        );
    }
}
