//! Double-hash digests for block headers
//!
//! Provides the hash-of-hash function applied to serialized headers and the
//! single conversion point between wire order and display order.

use crate::{Error, Result};
use blake2::Blake2s256;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Size of a digest or header hash field in bytes
pub const HASH_SIZE: usize = 32;

/// Hash primitive applied twice by [`DoubleDigest`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-256, giving Bitcoin's SHA-256d
    #[default]
    #[value(name = "sha256")]
    #[serde(rename = "sha256")]
    Sha256,
    /// Blake2s-256
    #[value(name = "blake2s256")]
    #[serde(rename = "blake2s256")]
    Blake2s256,
}

impl HashAlgorithm {
    /// Apply the primitive once
    pub fn hash(&self, data: &[u8]) -> [u8; HASH_SIZE] {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).into(),
            HashAlgorithm::Blake2s256 => Blake2s256::digest(data).into(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Sha256 => write!(f, "sha256"),
            HashAlgorithm::Blake2s256 => write!(f, "blake2s256"),
        }
    }
}

/// Hash-of-hash over a serialized header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubleDigest {
    algorithm: HashAlgorithm,
}

impl DoubleDigest {
    /// Create a digest function over the given primitive
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The primitive in use
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest the header bytes, returning the result in wire order
    #[inline]
    pub fn digest(&self, header: &[u8]) -> [u8; HASH_SIZE] {
        let first = self.algorithm.hash(header);
        self.algorithm.hash(&first)
    }
}

/// Convert a wire-order digest to display order.
///
/// This is the only place a digest gets reversed on its way out. The result
/// is typed so that it cannot be fed back into hashing by accident.
#[inline]
pub fn to_display_order(wire: [u8; HASH_SIZE]) -> DisplayHash {
    let mut display = wire;
    display.reverse();
    DisplayHash(display)
}

/// A 32-byte hash in display order (byte-reversed relative to the wire)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayHash([u8; HASH_SIZE]);

impl DisplayHash {
    /// Wrap bytes that are already in display order
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Wrap a display-order slice, checking its length
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; HASH_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::invalid_field_length("display hash", HASH_SIZE, bytes.len()))?;
        Ok(Self(array))
    }

    /// Display-order bytes
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Convert back to wire order, for writing into a header field
    pub fn to_wire_order(&self) -> [u8; HASH_SIZE] {
        let mut wire = self.0;
        wire.reverse();
        wire
    }

    /// Hex string in display order
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for DisplayHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for DisplayHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for DisplayHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplayHash({})", self.to_hex())
    }
}

impl Serialize for DisplayHash {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DisplayHash {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DisplayHash::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_sha256_vector() {
        // SHA256d("hello")
        let digest = DoubleDigest::new(HashAlgorithm::Sha256).digest(b"hello");
        assert_eq!(
            hex::encode(digest),
            "9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
        );
    }

    #[test]
    fn test_digest_is_hash_of_hash() {
        for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Blake2s256] {
            let once = algorithm.hash(b"header");
            let twice = algorithm.hash(&once);
            assert_eq!(DoubleDigest::new(algorithm).digest(b"header"), twice);
        }
    }

    #[test]
    fn test_algorithms_differ() {
        let data = [0u8; 80];
        let sha = DoubleDigest::new(HashAlgorithm::Sha256).digest(&data);
        let blake = DoubleDigest::new(HashAlgorithm::Blake2s256).digest(&data);
        assert_ne!(sha, blake);
    }

    #[test]
    fn test_display_order_is_involution() {
        let wire = DoubleDigest::default().digest(b"involution");
        let display = to_display_order(wire);

        assert_eq!(display.as_bytes()[0], wire[31]);
        assert_eq!(display.as_bytes()[31], wire[0]);
        assert_eq!(display.to_wire_order(), wire);
    }

    #[test]
    fn test_display_hash_hex_parsing() {
        let hex_str = "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";
        let hash: DisplayHash = hex_str.parse().unwrap();
        assert_eq!(hash.to_hex(), hex_str);
        assert_eq!(hash.to_wire_order()[31], 0x00);
        assert_eq!(hash.to_wire_order()[0], 0x6f);
    }

    #[test]
    fn test_display_hash_rejects_wrong_length() {
        let err = "abcd".parse::<DisplayHash>().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidFieldLength { expected: 32, actual: 2, .. }
        ));
        assert!(matches!("not hex".parse::<DisplayHash>(), Err(Error::Hex(_))));
    }

    #[test]
    fn test_display_hash_serde() {
        let hash = DisplayHash::new([0xab; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: DisplayHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn test_hash_algorithm_display() {
        assert_eq!(HashAlgorithm::Sha256.to_string(), "sha256");
        assert_eq!(HashAlgorithm::Blake2s256.to_string(), "blake2s256");
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Sha256);
    }
}
