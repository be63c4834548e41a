//! Test fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use canon::cache::MemorySharedStore;
use canon::clock::{Clock, ManualClock};
use canon::oracle::{JsonRecord, MockOracle};
use canon::orchestrator::CacheOrchestrator;

pub const FIXED_TIMESTAMP: i64 = 1702512000;

pub const SHARED_CAPACITY: u64 = 1_000;

pub type TestOrchestrator = CacheOrchestrator<MockOracle, MemorySharedStore>;

/// Orchestrator, its oracle, shared store and clock, all sharing state with the
/// orchestrator's copies.
pub struct Harness {
    pub orchestrator: Arc<TestOrchestrator>,
    pub oracle: MockOracle,
    pub shared: MemorySharedStore,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_oracle(MockOracle::with_rows(account_rows(3)))
    }

    pub fn with_oracle(oracle: MockOracle) -> Self {
        let clock = ManualClock::new(FIXED_TIMESTAMP);
        let dyn_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let shared = MemorySharedStore::with_clock(SHARED_CAPACITY, dyn_clock.clone());
        let orchestrator =
            CacheOrchestrator::new(oracle.clone(), Some(shared.clone())).with_clock(dyn_clock);

        Self {
            orchestrator: Arc::new(orchestrator),
            oracle,
            shared,
            clock,
        }
    }
}

pub fn account_record(id: usize, name: &str) -> JsonRecord {
    let mut record = JsonRecord::new();
    record.insert("Id".to_string(), format!("001{:05}", id).into());
    record.insert("Name".to_string(), name.into());
    record
}

pub fn account_rows(count: usize) -> Vec<JsonRecord> {
    (0..count)
        .map(|i| account_record(i, &format!("Account {}", i)))
        .collect()
}
