//! Header Mine Sim
//!
//! A block-header mining simulator:
//! - 80-byte header buffer with little-endian field layout
//! - Double-hash digests (SHA-256d, optionally BLAKE2s-256d)
//! - Nonce/timestamp rolling mining cycles
//! - A debounced auto-mine scheduler with single-step support
//! - Chain tip following between cycles

pub mod config;
pub mod crypto;
pub mod cycle;
pub mod error;
pub mod header;
pub mod scheduler;
pub mod sink;
pub mod tip;
pub mod types;
pub mod utils;

pub use config::Config;
pub use crypto::{to_display_order, DisplayHash, DoubleDigest, HashAlgorithm, HASH_SIZE};
pub use cycle::{Clock, FixedClock, MiningCycle, SystemClock};
pub use error::{Error, Result};
pub use header::{HeaderBuffer, HEADER_SIZE};
pub use scheduler::{MineScheduler, SchedulerConfig, SchedulerState, Snapshot};
pub use sink::{ChannelSink, EventSink, MemorySink, TracingSink};
pub use tip::{ChannelPollControl, NoopPollControl, PollControl, PollSignal, TipFollower};
pub use types::*;

/// Application information
pub const APP_NAME: &str = "header-mine-sim";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
