//! # Hash Ring
//!
//! Identity, hash space and range arithmetic for a Chord-style storage ring.
//!
//! Every node and every filename is mapped onto the same 256-bit circular
//! space by SHA-256. A key is owned by the first node found clockwise from
//! it, where a node whose coordinate equals the key owns it outright.
//!
//! ```text
//!         0 ─────────────────────────────── 2^256
//!         │                                   │
//!         ├─ node A (10)
//!         ├─ node B (100)
//!         │      key "report.txt" (150) ──┐
//!         ├─ node C (200)  <──────────────┘ owner
//!         └─ wraps back to node A
//! ```
//!
//! ```rust
//! use hash_ring::{in_range, HashCoordinate};
//!
//! let ten = HashCoordinate::from_u64(10);
//! let three = HashCoordinate::from_u64(3);
//!
//! // the arc from 10 to 3 wraps past the origin
//! assert!(in_range(&HashCoordinate::from_u64(1), &ten, &three).unwrap());
//! assert!(!in_range(&HashCoordinate::from_u64(5), &ten, &three).unwrap());
//! assert!(in_range(&HashCoordinate::from_u64(5), &three, &ten).unwrap());
//! ```

mod membership;
mod node;

pub use membership::Membership;
pub use node::NodeId;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Width of a coordinate in bytes (SHA-256 output).
pub const COORDINATE_BYTES: usize = 32;

/// Width of a coordinate in lowercase hex digits.
pub const COORDINATE_HEX_LEN: usize = COORDINATE_BYTES * 2;

/// A position on the ring.
///
/// Stored big-endian, so the derived ordering over the bytes is the numeric
/// ordering of the 256-bit integer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HashCoordinate([u8; COORDINATE_BYTES]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("key is empty")]
    Empty,

    #[error("key has {0} hex digits, at most {} allowed", COORDINATE_HEX_LEN)]
    TooLong(usize),

    #[error("key is not hexadecimal: {0}")]
    NotHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("degenerate range: both anchors are {0}")]
    Degenerate(HashCoordinate),
}

impl HashCoordinate {
    pub fn from_bytes(bytes: [u8; COORDINATE_BYTES]) -> Self {
        HashCoordinate(bytes)
    }

    /// Places a small integer on the ring. Mostly useful for hand-built rings.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; COORDINATE_BYTES];
        bytes[COORDINATE_BYTES - 8..].copy_from_slice(&value.to_be_bytes());
        HashCoordinate(bytes)
    }

    /// Parses a hex key the way an integer parse would: case-insensitive,
    /// leading zeros optional.
    pub fn from_hex(s: &str) -> Result<Self, KeyParseError> {
        let digits = s.trim();
        if digits.is_empty() {
            return Err(KeyParseError::Empty);
        }
        if digits.len() > COORDINATE_HEX_LEN {
            return Err(KeyParseError::TooLong(digits.len()));
        }

        let padded = format!("{:0>width$}", digits, width = COORDINATE_HEX_LEN);
        let mut bytes = [0u8; COORDINATE_BYTES];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|_| KeyParseError::NotHex(digits.to_string()))?;
        Ok(HashCoordinate(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; COORDINATE_BYTES] {
        &self.0
    }
}

impl fmt::Display for HashCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for HashCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // a shortened form keeps node dumps readable
        let hex = self.to_hex();
        let trimmed = hex.trim_start_matches('0');
        if trimmed.len() <= 16 {
            write!(f, "HashCoordinate(0x{})", if trimmed.is_empty() { "0" } else { trimmed })
        } else {
            write!(f, "HashCoordinate({}..)", &hex[..16])
        }
    }
}

impl FromStr for HashCoordinate {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HashCoordinate::from_hex(s)
    }
}

impl TryFrom<String> for HashCoordinate {
    type Error = KeyParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        HashCoordinate::from_hex(&s)
    }
}

impl From<HashCoordinate> for String {
    fn from(coordinate: HashCoordinate) -> Self {
        coordinate.to_hex()
    }
}

/// Maps a string (a `host:port` identity or a filename) onto the ring.
///
/// Every node must agree on this function; it is SHA-256 over the UTF-8
/// bytes.
pub fn hash_key(s: &str) -> HashCoordinate {
    let digest = Sha256::digest(s.as_bytes());
    let mut bytes = [0u8; COORDINATE_BYTES];
    bytes.copy_from_slice(&digest);
    HashCoordinate(bytes)
}

/// Circular interval test.
///
/// Returns whether `key` lies on the clockwise arc that starts just after
/// `lower` and ends at `upper`. Both anchors themselves count as inside: a
/// key sitting exactly on a node's coordinate belongs to that node.
///
/// Fails when `lower == upper`, which only happens when a one-node ring is
/// asked to bound a range by itself.
pub fn in_range(
    key: &HashCoordinate,
    lower: &HashCoordinate,
    upper: &HashCoordinate,
) -> Result<bool, RangeError> {
    if lower == upper {
        return Err(RangeError::Degenerate(*lower));
    }
    if key == lower || key == upper {
        return Ok(true);
    }

    if lower > upper {
        // arc wraps past the origin
        Ok(key > lower || key < upper)
    } else {
        Ok(lower < key && key < upper)
    }
}
