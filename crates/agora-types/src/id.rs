use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

fn parse_hex32(s: &str) -> Result<[u8; 32], TypeError> {
    let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(TypeError::InvalidLength {
            expected: 32,
            actual: bytes.len(),
        });
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// Content-addressed identifier of a single revision.
///
/// A `RevisionId` is the BLAKE3 hash of the revision's canonical payload
/// bytes, its parent revision (if any), and per-revision entropy. Two calls
/// that create the same payload still produce distinct revisions.
///
/// The `RevisionId` of a record's current head is the optimistic-concurrency
/// token required by the next `update`/`delete` call.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RevisionId([u8; 32]);

impl RevisionId {
    /// Compute a revision identifier from canonical payload bytes, the
    /// parent revision, and caller-supplied entropy.
    pub fn compute(payload: &[u8], parent: Option<&RevisionId>, entropy: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(payload);
        if let Some(parent) = parent {
            hasher.update(&parent.0);
        }
        hasher.update(&entropy.to_le_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Create a `RevisionId` from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        parse_hex32(s).map(Self)
    }
}

impl fmt::Debug for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionId({})", self.short_hex())
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Stable content-addressed identity of a mutable record.
///
/// Assigned at creation (it is the hash of the record's first revision) and
/// never changes across any number of updates. Used as the key for caching,
/// linking, and status association.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId([u8; 32]);

impl RecordId {
    /// Create a `RecordId` from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation. This is the cache key encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        parse_hex32(s).map(Self)
    }
}

impl From<RevisionId> for RecordId {
    /// A record is named by the id of its first revision.
    fn from(revision: RevisionId) -> Self {
        Self(revision.0)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.short_hex())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Identity of an acting agent (a user's key material, hashed).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId([u8; 32]);

impl ActorId {
    /// Derive an `ActorId` from raw identity material.
    pub fn derive(material: &[u8]) -> Self {
        Self(*blake3::hash(material).as_bytes())
    }

    /// Create an `ActorId` from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        parse_hex32(s).map(Self)
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
