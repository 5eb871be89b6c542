//! Chain tip following
//!
//! [`TipFollower`] is the inbound side: an external poller hands it the
//! latest tip and the scheduler writes it into the previous-hash field
//! between cycles. [`PollControl`] is the outbound side: the scheduler tells
//! the poller when to run so polling tracks the mining loop.

use crate::crypto::{DisplayHash, HASH_SIZE};
use crate::scheduler::Command;
use crate::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Notifications to the tip polling layer
pub trait PollControl: Send + Sync {
    /// Mining (re)started; resume polling
    fn start_poll(&self);

    /// Mining stop requested; pause polling
    fn pause_poll(&self);
}

/// Ignores poll notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPollControl;

impl PollControl for NoopPollControl {
    fn start_poll(&self) {}

    fn pause_poll(&self) {}
}

/// A poll notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PollSignal {
    /// Resume polling
    Start,
    /// Pause polling
    Pause,
}

/// Forwards poll notifications over a channel
#[derive(Debug, Clone)]
pub struct ChannelPollControl {
    tx: mpsc::UnboundedSender<PollSignal>,
}

impl ChannelPollControl {
    /// Create the control and the poller's receiving end
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PollSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, signal: PollSignal) {
        if self.tx.send(signal).is_err() {
            warn!(?signal, "Poller went away, dropping notification");
        }
    }
}

impl PollControl for ChannelPollControl {
    fn start_poll(&self) {
        self.send(PollSignal::Start);
    }

    fn pause_poll(&self) {
        self.send(PollSignal::Pause);
    }
}

/// Records poll notifications in order
#[derive(Debug, Clone, Default)]
pub struct RecordingPollControl {
    signals: Arc<Mutex<Vec<PollSignal>>>,
}

impl RecordingPollControl {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications so far
    pub fn signals(&self) -> Vec<PollSignal> {
        self.signals.lock().clone()
    }

    /// Number of start notifications
    pub fn starts(&self) -> usize {
        self.count(PollSignal::Start)
    }

    /// Number of pause notifications
    pub fn pauses(&self) -> usize {
        self.count(PollSignal::Pause)
    }

    fn count(&self, signal: PollSignal) -> usize {
        self.signals.lock().iter().filter(|s| **s == signal).count()
    }
}

impl PollControl for RecordingPollControl {
    fn start_poll(&self) {
        self.signals.lock().push(PollSignal::Start);
    }

    fn pause_poll(&self) {
        self.signals.lock().push(PollSignal::Pause);
    }
}

/// Inbound tip updates for one scheduler.
///
/// Cloneable and cheap; it can only touch the previous-hash field.
#[derive(Debug, Clone)]
pub struct TipFollower {
    tx: mpsc::UnboundedSender<Command>,
}

impl TipFollower {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { tx }
    }

    /// Apply a tip given as display-order bytes.
    ///
    /// The length is checked here, before anything reaches the header.
    pub fn on_new_tip(&self, hash_display_order: &[u8]) -> Result<()> {
        if hash_display_order.len() != HASH_SIZE {
            return Err(Error::invalid_field_length(
                "previous_hash",
                HASH_SIZE,
                hash_display_order.len(),
            ));
        }
        self.apply(DisplayHash::from_slice(hash_display_order)?)
    }

    /// Apply a tip given as display-order hex, as block explorers print it
    pub fn on_new_tip_hex(&self, hash_display_hex: &str) -> Result<()> {
        self.apply(DisplayHash::from_str(hash_display_hex)?)
    }

    /// Apply an already-parsed tip
    pub fn apply(&self, tip: DisplayHash) -> Result<()> {
        debug!(tip = %tip, "Queueing tip update");
        self.tx
            .send(Command::NewTip(tip))
            .map_err(|_| Error::misuse("scheduler is no longer running"))
    }
}
