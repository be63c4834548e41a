//! Cache slot identity.

use crate::canonical::CanonicalKey;
use crate::constants::SHARED_KEY_PREFIX;
use crate::hashing::{digest_hex, hash_cache_key};

/// 32-byte BLAKE3 digest identifying one cache slot.
///
/// Derived from the canonical text, the optional parameter-binding fingerprint and the
/// access-control flag. Renders as lower-case hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Derives the key for a canonical query.
    #[inline]
    pub fn derive(
        canonical: &CanonicalKey,
        bindings_hash: Option<u64>,
        enforce_access_control: bool,
    ) -> Self {
        Self(hash_cache_key(
            canonical.as_str(),
            bindings_hash,
            enforce_access_control,
        ))
    }

    /// Wraps a precomputed digest.
    #[inline]
    pub const fn from_digest(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[inline]
    pub fn to_hex(&self) -> String {
        digest_hex(&self.0)
    }

    /// Key used for the shared tier (`canon:v1:<hex>`).
    #[inline]
    pub fn storage_key(&self) -> String {
        format!("{}{}", SHARED_KEY_PREFIX, self.to_hex())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hex = self.to_hex();
        write!(f, "CacheKey({}…)", &hex[..12])
    }
}
