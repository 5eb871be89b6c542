//! A single hash attempt: roll the nonce, stamp the time, digest, report

use crate::crypto::{to_display_order, DoubleDigest};
use crate::header::HeaderBuffer;
use crate::sink::EventSink;
use crate::types::MiningEvent;
use crate::utils::{current_timestamp_secs, format_timestamp};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Source of "now" for header timestamps
pub trait Clock: Send + Sync {
    /// Current time in Unix seconds
    fn now(&self) -> u32;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u32 {
        current_timestamp_secs()
    }
}

/// A clock that only moves when told to
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    now: Arc<AtomicU32>,
}

impl FixedClock {
    /// Create a clock stopped at `timestamp`
    pub fn new(timestamp: u32) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(timestamp)),
        }
    }

    /// Move the clock to `timestamp`; may go backwards
    pub fn set(&self, timestamp: u32) {
        self.now.store(timestamp, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }
}

/// One indivisible unit of mining work
#[derive(Clone)]
pub struct MiningCycle {
    digest: DoubleDigest,
    clock: Arc<dyn Clock>,
}

impl MiningCycle {
    /// Create a cycle over the given digest and clock
    pub fn new(digest: DoubleDigest, clock: Arc<dyn Clock>) -> Self {
        Self { digest, clock }
    }

    /// Create a cycle using wall-clock time
    pub fn with_system_clock(digest: DoubleDigest) -> Self {
        Self::new(digest, Arc::new(SystemClock))
    }

    /// Digest function in use
    pub fn digest(&self) -> DoubleDigest {
        self.digest
    }

    /// Run one attempt against `header`, emit the result to `sink` and return it.
    ///
    /// The nonce wraps at `u32::MAX`. The timestamp is whatever the clock
    /// says at execution time.
    pub fn run(&self, header: &mut HeaderBuffer, sink: &dyn EventSink) -> MiningEvent {
        let nonce = header.nonce().wrapping_add(1);
        header.set_nonce(nonce);

        let timestamp = self.clock.now();
        header.set_timestamp(timestamp);

        let bytes = header.serialized();
        let digest = to_display_order(self.digest.digest(&bytes));

        let event = MiningEvent {
            nonce,
            timestamp,
            timestamp_display: format_timestamp(timestamp),
            header_hex: hex::encode(bytes),
            digest,
        };

        trace!(nonce, timestamp, hash = %event.digest, "Cycle complete");
        sink.on_cycle(&event);
        event
    }
}

impl std::fmt::Debug for MiningCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiningCycle")
            .field("algorithm", &self.digest.algorithm())
            .finish()
    }
}
