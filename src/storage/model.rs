//! Storage model types.

use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};
use serde::Serialize as SerdeSerialize;
use serde::de::DeserializeOwned;

use super::error::{StorageError, StorageResult};
use crate::cache::{CacheKey, Tier};
use crate::constants::PAYLOAD_FORMAT_VERSION;

const VERSION_HEADER_LEN: usize = 2;

/// Cached query result as held by one tier.
///
/// `payload` is the JSON-encoded row sequence; decoding is deferred to the hit path so
/// a tier never needs to know the record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Slot this entry belongs to.
    pub key: CacheKey,
    /// JSON-encoded rows.
    pub payload: Vec<u8>,
    /// Number of rows in `payload`.
    pub row_count: usize,
    /// Unix timestamp when the entry was written.
    pub stored_at: i64,
    /// Shared-tier time-to-live; scoped entries ignore it.
    pub ttl_secs: u64,
    /// Tier the entry was read from.
    pub source_tier: Tier,
}

impl CacheEntry {
    /// Returns `true` once `now` reaches `stored_at + ttl_secs`.
    #[inline]
    pub fn is_expired_at(&self, now: i64) -> bool {
        let expires_at = self.stored_at.saturating_add_unsigned(self.ttl_secs);
        now >= expires_at
    }

    /// Decodes the payload into rows.
    pub fn decode_rows<R: DeserializeOwned>(&self) -> StorageResult<Vec<R>> {
        decode_rows(&self.payload)
    }
}

/// Shared-tier blob body, archived with `rkyv` behind a two-byte version header.
///
/// # Example
/// ```rust
/// use canon::storage::SharedEnvelope;
///
/// let envelope = SharedEnvelope::new(60, 1, b"[{\"Id\":\"001\"}]".to_vec());
/// let blob = envelope.encode().unwrap();
/// assert_eq!(SharedEnvelope::decode(&blob).unwrap(), envelope);
/// ```
#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Eq, Clone)]
pub struct SharedEnvelope {
    /// Time-to-live requested by the writer.
    pub ttl_secs: u64,
    /// Number of rows in `payload`.
    pub row_count: u64,
    /// JSON-encoded rows.
    pub payload: Vec<u8>,
}

impl SharedEnvelope {
    pub fn new(ttl_secs: u64, row_count: u64, payload: Vec<u8>) -> Self {
        Self {
            ttl_secs,
            row_count,
            payload,
        }
    }

    /// Serializes to `[version: u16 LE][rkyv archive]`.
    pub fn encode(&self) -> StorageResult<Vec<u8>> {
        let archived = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|e| StorageError::Encode(e.to_string()))?;
        let mut blob = Vec::with_capacity(VERSION_HEADER_LEN + archived.len());
        blob.extend_from_slice(&PAYLOAD_FORMAT_VERSION.to_le_bytes());
        blob.extend_from_slice(&archived);
        Ok(blob)
    }

    /// Parses a blob written by [`SharedEnvelope::encode`].
    ///
    /// Blobs carrying any other version are rejected with
    /// [`StorageError::UnsupportedVersion`] so readers can treat them as absent.
    pub fn decode(blob: &[u8]) -> StorageResult<Self> {
        if blob.len() < VERSION_HEADER_LEN {
            return Err(StorageError::Truncated { len: blob.len() });
        }
        let found = u16::from_le_bytes([blob[0], blob[1]]);
        if found != PAYLOAD_FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found,
                expected: PAYLOAD_FORMAT_VERSION,
            });
        }

        // The header shifts the archive off its alignment; copy into aligned storage.
        let mut aligned = AlignedVec::<16>::with_capacity(blob.len() - VERSION_HEADER_LEN);
        aligned.extend_from_slice(&blob[VERSION_HEADER_LEN..]);
        rkyv::from_bytes::<SharedEnvelope, rkyv::rancor::Error>(&aligned)
            .map_err(|e| StorageError::Decode(e.to_string()))
    }
}

/// JSON-encodes a row sequence.
pub fn encode_rows<R: SerdeSerialize>(rows: &[R]) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(rows).map_err(|e| StorageError::Encode(e.to_string()))
}

/// Decodes a JSON row sequence.
pub fn decode_rows<R: DeserializeOwned>(payload: &[u8]) -> StorageResult<Vec<R>> {
    serde_json::from_slice(payload).map_err(|e| StorageError::Decode(e.to_string()))
}
