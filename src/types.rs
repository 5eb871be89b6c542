//! Core types for header mining
//!
//! The logical block header as callers supply it, and the per-cycle event
//! handed to the display layer.

use crate::crypto::DisplayHash;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A block header as supplied by callers.
///
/// Hash fields are kept in display order, the way explorers and RPC
/// interfaces print them. They are reversed into wire order exactly once,
/// when the header is loaded into a [`HeaderBuffer`](crate::header::HeaderBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block version
    pub version: u32,
    /// Hash of the previous block (display order)
    pub previous_hash: DisplayHash,
    /// Merkle root of the block's transactions (display order)
    pub merkle_root: DisplayHash,
    /// Block timestamp (Unix seconds)
    pub timestamp: u32,
    /// Compact difficulty encoding, stored but never interpreted
    pub bits: u32,
    /// Proof-of-work nonce
    pub nonce: u32,
}

impl BlockHeader {
    /// The Bitcoin genesis block header
    pub fn genesis() -> Self {
        Self {
            version: 1,
            previous_hash: DisplayHash::new([0u8; 32]),
            merkle_root: DisplayHash::new(GENESIS_MERKLE_ROOT),
            timestamp: 1_231_006_505,
            bits: 0x1d00ffff,
            nonce: 2_083_236_893,
        }
    }

    /// Parse a header from hex-encoded hash fields
    pub fn from_hex_fields(
        version: u32,
        previous_hash: &str,
        merkle_root: &str,
        timestamp: u32,
        bits: u32,
        nonce: u32,
    ) -> Result<Self> {
        Ok(Self {
            version,
            previous_hash: previous_hash.parse()?,
            merkle_root: merkle_root.parse()?,
            timestamp,
            bits,
            nonce,
        })
    }

    /// Bits rendered the way block explorers show them
    pub fn bits_hex(&self) -> String {
        format!("{:08x}", self.bits)
    }
}

impl Default for BlockHeader {
    fn default() -> Self {
        Self::genesis()
    }
}

impl fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "version={} prev={} merkle={} time={} bits={} nonce={}",
            self.version,
            self.previous_hash,
            self.merkle_root,
            self.timestamp,
            self.bits_hex(),
            self.nonce
        )
    }
}

/// Genesis merkle root in display order
const GENESIS_MERKLE_ROOT: [u8; 32] = [
    0x4a, 0x5e, 0x1e, 0x4b, 0xaa, 0xb8, 0x9f, 0x3a, 0x32, 0x51, 0x8a, 0x88, 0xc3, 0x1b, 0xc8, 0x7f,
    0x61, 0x8f, 0x76, 0x67, 0x3e, 0x2c, 0xc7, 0x7a, 0xb2, 0x12, 0x7b, 0x7a, 0xfd, 0xed, 0xa3, 0x3b,
];

/// Result of one mining cycle, delivered to the display layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningEvent {
    /// Nonce used for this attempt
    pub nonce: u32,
    /// Timestamp written into the header (Unix seconds)
    pub timestamp: u32,
    /// Human-readable timestamp
    pub timestamp_display: String,
    /// Serialized header in wire order, hex encoded
    pub header_hex: String,
    /// Header digest in display order
    pub digest: DisplayHash,
}

impl MiningEvent {
    /// Serialized header bytes, decoded from the event
    pub fn header_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.header_hex).map_err(Error::from)
    }
}

impl fmt::Display for MiningEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nonce={} time={} hash={}",
            self.nonce, self.timestamp_display, self.digest
        )
    }
}
