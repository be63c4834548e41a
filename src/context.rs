//! Execution context: the lifetime boundary of the scoped tier.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::cache::ScopedTier;

/// One logical unit of work (a request, a transaction).
///
/// Owns its scoped tier exclusively; dropping the context drops every scoped entry.
/// Pass it by `&mut` into [`crate::CacheOrchestrator`] calls.
#[derive(Debug)]
pub struct ExecutionContext {
    id: Uuid,
    started_at: DateTime<Utc>,
    scoped: ScopedTier,
}

impl ExecutionContext {
    /// Creates a context with a default-capacity scoped tier.
    pub fn new() -> Self {
        Self::with_scoped_tier(ScopedTier::new())
    }

    /// Creates a context whose scoped tier holds at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_scoped_tier(ScopedTier::with_capacity(capacity))
    }

    pub fn with_scoped_tier(scoped: ScopedTier) -> Self {
        let id = Uuid::new_v4();
        debug!(context_id = %id, capacity = scoped.capacity(), "Execution context opened");
        Self {
            id,
            started_at: Utc::now(),
            scoped,
        }
    }

    /// Correlation id for logs.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[inline]
    pub fn scoped(&self) -> &ScopedTier {
        &self.scoped
    }

    #[inline]
    pub fn scoped_mut(&mut self) -> &mut ScopedTier {
        &mut self.scoped
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        debug!(
            context_id = %self.id,
            entries = self.scoped.len(),
            "Execution context closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, Tier};
    use crate::storage::CacheEntry;

    #[test]
    fn test_contexts_have_distinct_ids() {
        let a = ExecutionContext::new();
        let b = ExecutionContext::new();
        assert_ne!(a.id(), b.id());
        assert!(a.started_at() <= Utc::now());
    }

    #[test]
    fn test_context_capacity() {
        let ctx = ExecutionContext::with_capacity(3);
        assert_eq!(ctx.scoped().capacity(), 3);
        assert!(ctx.scoped().is_empty());
    }

    #[test]
    fn test_scoped_entries_are_per_context() {
        let mut a = ExecutionContext::new();
        let b = ExecutionContext::new();
        let key = CacheKey::from_digest([7; 32]);

        a.scoped_mut().insert(CacheEntry {
            key,
            payload: b"[]".to_vec(),
            row_count: 0,
            stored_at: 0,
            ttl_secs: 0,
            source_tier: Tier::Scoped,
        });

        assert!(a.scoped().contains(&key));
        assert!(!b.scoped().contains(&key));
    }
}
