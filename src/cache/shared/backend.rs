use super::error::SharedStoreResult;

/// Raw blob as held by a shared-tier backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedRecord {
    /// Version-tagged envelope bytes (see [`crate::storage::SharedEnvelope`]).
    pub blob: Vec<u8>,
    /// Unix timestamp the backend recorded at `put` time.
    pub stored_at: i64,
}

/// Shared-tier backend.
///
/// Read returns a possibly stale snapshot; write overwrites unconditionally. No
/// compare-and-swap is required. Implementations are shared across contexts and must
/// tolerate concurrent calls.
pub trait SharedStore: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = SharedStoreResult<Option<SharedRecord>>> + Send;

    /// Stores `blob` under `key`. The backend may evict it earlier than `ttl_secs`.
    fn put(
        &self,
        key: &str,
        blob: Vec<u8>,
        ttl_secs: u64,
    ) -> impl std::future::Future<Output = SharedStoreResult<()>> + Send;

    /// Best-effort removal.
    fn remove(&self, key: &str) -> impl std::future::Future<Output = SharedStoreResult<()>> + Send;
}
