//! The 80-byte serialized block header and its field mutators

use crate::crypto::{to_display_order, DisplayHash, HASH_SIZE};
use crate::types::BlockHeader;
use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// Serialized header size in bytes
pub const HEADER_SIZE: usize = 80;

const VERSION_OFFSET: usize = 0;
const PREVIOUS_HASH_OFFSET: usize = 4;
const MERKLE_ROOT_OFFSET: usize = 36;
const TIMESTAMP_OFFSET: usize = 68;
const BITS_OFFSET: usize = 72;
const NONCE_OFFSET: usize = 76;

/// Canonical wire-order header bytes.
///
/// Integers are little-endian, hashes are raw 32-byte digests in internal
/// order. Every mutator writes into a fixed slice, so the layout never
/// changes.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderBuffer {
    bytes: [u8; HEADER_SIZE],
}

impl HeaderBuffer {
    /// Create a buffer from serialized wire bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; HEADER_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::invalid_field_length("header", HEADER_SIZE, bytes.len()))?;
        Ok(Self { bytes })
    }

    /// Create a buffer from a logical header, reversing its hashes into wire order
    pub fn from_header(header: &BlockHeader) -> Self {
        let mut buffer = Self {
            bytes: [0u8; HEADER_SIZE],
        };
        buffer.set_version(header.version);
        buffer.write_hash(PREVIOUS_HASH_OFFSET, &header.previous_hash.to_wire_order());
        buffer.write_hash(MERKLE_ROOT_OFFSET, &header.merkle_root.to_wire_order());
        buffer.set_timestamp(header.timestamp);
        buffer.set_bits(header.bits);
        buffer.set_nonce(header.nonce);
        buffer
    }

    /// Convert back to the logical header
    pub fn to_header(&self) -> BlockHeader {
        BlockHeader {
            version: self.version(),
            previous_hash: to_display_order(self.previous_hash()),
            merkle_root: to_display_order(self.merkle_root()),
            timestamp: self.timestamp(),
            bits: self.bits(),
            nonce: self.nonce(),
        }
    }

    /// Overwrite the version field
    pub fn set_version(&mut self, version: u32) {
        LittleEndian::write_u32(&mut self.bytes[VERSION_OFFSET..VERSION_OFFSET + 4], version);
    }

    /// Overwrite the previous block hash (wire order)
    pub fn set_previous_hash(&mut self, hash: &[u8]) -> Result<()> {
        let hash = Self::check_hash("previous_hash", hash)?;
        self.write_hash(PREVIOUS_HASH_OFFSET, &hash);
        Ok(())
    }

    /// Overwrite the merkle root (wire order)
    pub fn set_merkle_root(&mut self, root: &[u8]) -> Result<()> {
        let root = Self::check_hash("merkle_root", root)?;
        self.write_hash(MERKLE_ROOT_OFFSET, &root);
        Ok(())
    }

    /// Overwrite the timestamp field
    pub fn set_timestamp(&mut self, timestamp: u32) {
        LittleEndian::write_u32(
            &mut self.bytes[TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + 4],
            timestamp,
        );
    }

    /// Overwrite the bits field
    pub fn set_bits(&mut self, bits: u32) {
        LittleEndian::write_u32(&mut self.bytes[BITS_OFFSET..BITS_OFFSET + 4], bits);
    }

    /// Overwrite the nonce field
    pub fn set_nonce(&mut self, nonce: u32) {
        LittleEndian::write_u32(&mut self.bytes[NONCE_OFFSET..NONCE_OFFSET + 4], nonce);
    }

    /// Apply a tip update delivered in display order
    pub fn set_previous_hash_display(&mut self, hash: &DisplayHash) {
        self.write_hash(PREVIOUS_HASH_OFFSET, &hash.to_wire_order());
    }

    /// Copy of the serialized header
    pub fn serialized(&self) -> [u8; HEADER_SIZE] {
        self.bytes
    }

    /// Version field
    pub fn version(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[VERSION_OFFSET..])
    }

    /// Previous block hash (wire order)
    pub fn previous_hash(&self) -> [u8; HASH_SIZE] {
        self.read_hash(PREVIOUS_HASH_OFFSET)
    }

    /// Merkle root (wire order)
    pub fn merkle_root(&self) -> [u8; HASH_SIZE] {
        self.read_hash(MERKLE_ROOT_OFFSET)
    }

    /// Timestamp field
    pub fn timestamp(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[TIMESTAMP_OFFSET..])
    }

    /// Bits field
    pub fn bits(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[BITS_OFFSET..])
    }

    /// Nonce field
    pub fn nonce(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[NONCE_OFFSET..])
    }

    /// Hex encoding of the wire bytes
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    fn check_hash(field: &'static str, hash: &[u8]) -> Result<[u8; HASH_SIZE]> {
        hash.try_into()
            .map_err(|_| Error::invalid_field_length(field, HASH_SIZE, hash.len()))
    }

    fn write_hash(&mut self, offset: usize, hash: &[u8; HASH_SIZE]) {
        self.bytes[offset..offset + HASH_SIZE].copy_from_slice(hash);
    }

    fn read_hash(&self, offset: usize) -> [u8; HASH_SIZE] {
        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&self.bytes[offset..offset + HASH_SIZE]);
        hash
    }
}

impl From<&BlockHeader> for HeaderBuffer {
    fn from(header: &BlockHeader) -> Self {
        Self::from_header(header)
    }
}

impl fmt::Debug for HeaderBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderBuffer")
            .field("hex", &self.to_hex())
            .field("nonce", &self.nonce())
            .field("timestamp", &self.timestamp())
            .finish()
    }
}
