use super::*;
use crate::cache::{FlakySharedStore, MemorySharedStore, StorageMode};
use crate::canonical::CanonicalError;
use crate::clock::ManualClock;
use crate::oracle::{JsonRecord, MockOracle, OracleError};

const T0: i64 = 1_700_000_000;

type TestOrchestrator = CacheOrchestrator<MockOracle, MemorySharedStore>;

fn create_orchestrator(oracle: &MockOracle, clock: &ManualClock) -> TestOrchestrator {
    let clock: Arc<dyn Clock> = Arc::new(clock.clone());
    let shared = MemorySharedStore::with_clock(1_000, clock.clone());
    CacheOrchestrator::new(oracle.clone(), Some(shared)).with_clock(clock)
}

fn create_default() -> (TestOrchestrator, MockOracle, ManualClock) {
    let oracle = MockOracle::with_generated_rows(5);
    let clock = ManualClock::new(T0);
    (create_orchestrator(&oracle, &clock), oracle, clock)
}

#[tokio::test]
async fn test_cold_query_calls_oracle_once() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();

    let result = orchestrator
        .query(&mut ctx, "SELECT Id FROM Account", &CacheOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, CacheStatus::Miss);
    assert_eq!(result.row_count(), 5);
    assert!(!result.is_degraded());
    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test]
async fn test_equivalent_query_hits_scoped_tier() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();
    let options = CacheOptions::default();

    let first = orchestrator
        .query(
            &mut ctx,
            "SELECT Id, Name FROM Account WHERE Status = 'Active' AND Type='Customer'",
            &options,
        )
        .await
        .unwrap();
    let second = orchestrator
        .query(
            &mut ctx,
            "select Name,  Id from Account where Type = 'Customer' and Status='Active'",
            &options,
        )
        .await
        .unwrap();

    assert_eq!(second.status, CacheStatus::HitScoped);
    assert_eq!(second.key, first.key);
    assert_eq!(second.rows, first.rows);
    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test]
async fn test_oracle_receives_original_text() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();
    let text = "SELECT  Name,Id FROM Account";

    orchestrator
        .query(&mut ctx, text, &CacheOptions::default().with_access_control(true))
        .await
        .unwrap();

    let call = oracle.last_call().unwrap();
    assert_eq!(call.query, text);
    assert!(call.enforce_access_control);
}

#[tokio::test]
async fn test_new_context_hits_shared_tier() {
    let (orchestrator, oracle, _clock) = create_default();
    let options = CacheOptions::default();

    let mut first = ExecutionContext::new();
    orchestrator
        .query(&mut first, "SELECT Id FROM Account", &options)
        .await
        .unwrap();
    drop(first);

    let mut second = ExecutionContext::new();
    let result = orchestrator
        .query(&mut second, "SELECT Id FROM Account", &options)
        .await
        .unwrap();

    assert_eq!(result.status, CacheStatus::HitShared);
    assert_eq!(oracle.call_count(), 1);

    let again = orchestrator
        .query(&mut second, "SELECT Id FROM Account", &options)
        .await
        .unwrap();
    assert_eq!(again.status, CacheStatus::HitScoped);
}

#[tokio::test]
async fn test_expired_shared_entry_calls_oracle_again() {
    let (orchestrator, oracle, clock) = create_default();
    let options = CacheOptions::default()
        .with_storage_mode(StorageMode::SharedOnly)
        .with_ttl_secs(1);

    let mut ctx = ExecutionContext::new();
    orchestrator
        .query(&mut ctx, "SELECT Id FROM Account", &options)
        .await
        .unwrap();

    clock.advance(2);

    let result = orchestrator
        .query(&mut ctx, "SELECT Id FROM Account", &options)
        .await
        .unwrap();
    assert_eq!(result.status, CacheStatus::Miss);
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_bypass_is_isolated_from_cache() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();
    let text = "SELECT Id FROM Account";

    let bypassed = orchestrator
        .query(&mut ctx, text, &CacheOptions::bypassed())
        .await
        .unwrap();
    assert_eq!(bypassed.status, CacheStatus::Bypass);
    assert!(ctx.scoped().is_empty());
    assert!(orchestrator.store().shared().unwrap().is_empty());

    let cold = orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(cold.status, CacheStatus::Miss);

    let live = orchestrator
        .query(&mut ctx, text, &CacheOptions::bypassed())
        .await
        .unwrap();
    assert_eq!(live.status, CacheStatus::Bypass);

    let warm = orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(warm.status, CacheStatus::HitScoped);

    assert_eq!(oracle.call_count(), 3);
    let stats = orchestrator.stats().snapshot();
    assert_eq!(stats.bypassed, 2);
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.hits_scoped, 1);
}

#[tokio::test]
async fn test_scoped_capacity_policy() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::with_capacity(1);
    let options = CacheOptions::default().with_storage_mode(StorageMode::ScopedOnly);

    orchestrator
        .query(&mut ctx, "SELECT Id FROM Account", &options)
        .await
        .unwrap();
    orchestrator
        .query(&mut ctx, "SELECT Id FROM Contact", &options)
        .await
        .unwrap();

    let kept = orchestrator
        .query(&mut ctx, "SELECT Id FROM Account", &options)
        .await
        .unwrap();
    let rejected = orchestrator
        .query(&mut ctx, "SELECT Id FROM Contact", &options)
        .await
        .unwrap();

    assert_eq!(kept.status, CacheStatus::HitScoped);
    assert_eq!(rejected.status, CacheStatus::Miss);
    assert_eq!(oracle.call_count(), 3);
}

#[tokio::test]
async fn test_malformed_query_is_not_executed() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();

    let err = orchestrator
        .query(
            &mut ctx,
            "SELECT Id FROM Account WHERE Name = 'open",
            &CacheOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        QueryError::Malformed(CanonicalError::UnterminatedLiteral { .. })
    ));
    assert_eq!(oracle.call_count(), 0);
    assert_eq!(orchestrator.stats().snapshot().total_queries, 0);
}

#[tokio::test]
async fn test_oracle_failure_propagates_and_is_not_cached() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();
    let text = "SELECT Id FROM Account";

    oracle.fail_with("REQUEST_LIMIT_EXCEEDED");
    let err = orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        QueryError::Oracle(OracleError::new("REQUEST_LIMIT_EXCEEDED"))
    );
    assert!(ctx.scoped().is_empty());

    oracle.recover();
    let result = orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(result.status, CacheStatus::Miss);
    assert_eq!(oracle.call_count(), 2);
    assert_eq!(orchestrator.stats().snapshot().oracle_failures, 1);
}

#[tokio::test]
async fn test_max_results_applies_at_read_time() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();
    let text = "SELECT Id FROM Account";

    let capped = orchestrator
        .query(&mut ctx, text, &CacheOptions::default().with_max_results(3))
        .await
        .unwrap();
    assert_eq!(capped.status, CacheStatus::Miss);
    assert_eq!(capped.row_count(), 3);

    let stricter = orchestrator
        .query(&mut ctx, text, &CacheOptions::default().with_max_results(2))
        .await
        .unwrap();
    assert_eq!(stricter.status, CacheStatus::HitScoped);
    assert_eq!(stricter.row_count(), 2);

    let uncapped = orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(uncapped.status, CacheStatus::HitScoped);
    assert_eq!(uncapped.row_count(), 5);
    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test]
async fn test_capped_write_serves_full_rows_from_shared_tier() {
    let (orchestrator, oracle, _clock) = create_default();
    let text = "SELECT Id FROM Account";

    let mut first = ExecutionContext::new();
    orchestrator
        .query(&mut first, text, &CacheOptions::default().with_max_results(2))
        .await
        .unwrap();

    let mut second = ExecutionContext::new();
    let cached = orchestrator
        .query(&mut second, text, &CacheOptions::default())
        .await
        .unwrap();
    let live = orchestrator
        .query(&mut second, text, &CacheOptions::default().with_bypass(true))
        .await
        .unwrap();

    assert_eq!(cached.status, CacheStatus::HitShared);
    assert_eq!(cached.rows, live.rows);
    assert_eq!(cached.row_count(), 5);
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_access_control_flag_separates_slots() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();
    let text = "SELECT Id FROM Account";

    let open = orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap();
    let enforced = orchestrator
        .query(&mut ctx, text, &CacheOptions::default().with_access_control(true))
        .await
        .unwrap();

    assert_ne!(open.key, enforced.key);
    assert_eq!(enforced.status, CacheStatus::Miss);
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_bindings_separate_slots() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();
    let text = "SELECT Id FROM Account WHERE Industry = 'Technology'";
    let options = CacheOptions::default();

    let mut a = BTreeMap::new();
    a.insert("industry".to_string(), "'Technology'".to_string());
    let mut b = BTreeMap::new();
    b.insert("industry".to_string(), "'Energy'".to_string());

    let first = orchestrator
        .query_with_params(&mut ctx, text, &a, &options)
        .await
        .unwrap();
    let other = orchestrator
        .query_with_params(&mut ctx, text, &b, &options)
        .await
        .unwrap();
    let repeat = orchestrator
        .query_with_params(&mut ctx, text, &a, &options)
        .await
        .unwrap();

    assert_ne!(first.key, other.key);
    assert_eq!(repeat.key, first.key);
    assert_eq!(repeat.status, CacheStatus::HitScoped);
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_shared_outage_degrades_silently() {
    let oracle = MockOracle::with_generated_rows(2);
    let flaky = FlakySharedStore::default();
    flaky.go_down();
    let orchestrator = CacheOrchestrator::new(oracle.clone(), Some(flaky.clone()));

    let mut ctx = ExecutionContext::new();
    let first = orchestrator
        .query(&mut ctx, "SELECT Id FROM Account", &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(first.status, CacheStatus::Miss);
    assert!(matches!(
        first.degraded,
        Some(DegradedReason::SharedRead(_))
    ));
    assert_eq!(first.row_count(), 2);

    let second = orchestrator
        .query(&mut ctx, "SELECT Id FROM Account", &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(second.status, CacheStatus::HitScoped);
    assert_eq!(oracle.call_count(), 1);

    let stats = orchestrator.stats().snapshot();
    assert_eq!(stats.degraded, 2);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_without_shared_tier_new_context_misses() {
    let oracle = MockOracle::with_generated_rows(1);
    let orchestrator: CacheOrchestrator<MockOracle, MemorySharedStore> =
        CacheOrchestrator::new(oracle.clone(), None);

    let mut first = orchestrator.open_context();
    orchestrator
        .query(&mut first, "SELECT Id FROM Account", &CacheOptions::default())
        .await
        .unwrap();

    let mut second = orchestrator.open_context();
    let result = orchestrator
        .query(&mut second, "SELECT Id FROM Account", &CacheOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, CacheStatus::Miss);
    assert!(!result.is_degraded());
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_invalidate_forces_reexecution() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();
    let text = "SELECT Id FROM Account";

    orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap();
    assert!(
        orchestrator
            .invalidate(&mut ctx, "select Id  from Account", false)
            .await
            .unwrap()
    );

    let result = orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(result.status, CacheStatus::Miss);
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_invalidate_all_keeps_shared_entries() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();
    let text = "SELECT Id FROM Account";

    orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap();
    orchestrator.invalidate_all(&mut ctx);

    let result = orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(result.status, CacheStatus::HitShared);
    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test]
async fn test_typed_records_round_trip_through_cache() {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Account {
        id: String,
        revenue: u64,
    }

    #[derive(Clone)]
    struct AccountOracle;

    impl QueryOracle for AccountOracle {
        type Record = Account;

        async fn execute(
            &self,
            _query: &str,
            _enforce_access_control: bool,
        ) -> crate::oracle::OracleResult<Vec<Account>> {
            Ok(vec![Account {
                id: "001".to_string(),
                revenue: 2_000_000,
            }])
        }
    }

    let orchestrator = CacheOrchestrator::new(AccountOracle, Some(MemorySharedStore::new()));
    let mut ctx = ExecutionContext::new();
    let text = "SELECT Id, AnnualRevenue FROM Account";

    let miss = orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap();
    let hit = orchestrator
        .query(&mut ctx, text, &CacheOptions::default())
        .await
        .unwrap();

    assert_eq!(hit.status, CacheStatus::HitScoped);
    assert_eq!(hit.rows, miss.rows);
}

#[tokio::test]
async fn test_hit_rate_after_mixed_traffic() {
    let (orchestrator, _oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();

    for _ in 0..4 {
        orchestrator
            .query(&mut ctx, "SELECT Id FROM Account", &CacheOptions::default())
            .await
            .unwrap();
    }

    let stats = orchestrator.stats().snapshot();
    assert_eq!(stats.total_queries, 4);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hit_rate_percent, 75.0);
}

#[tokio::test]
async fn test_from_config_applies_limits() {
    let config = Config {
        scoped_capacity: 7,
        max_nesting_depth: 3,
        ..Config::default()
    };
    let orchestrator: TestOrchestrator =
        CacheOrchestrator::from_config(&config, MockOracle::new(), None);

    assert_eq!(orchestrator.canonicalizer().max_depth(), 3);
    assert_eq!(orchestrator.open_context().scoped().capacity(), 7);
}

#[tokio::test]
async fn test_from_config_default_options_drive_query_with_defaults() {
    let config = Config {
        storage_mode: StorageMode::ScopedOnly,
        default_ttl_secs: 120,
        ..Config::default()
    };
    let shared = MemorySharedStore::from_config(&config);
    let oracle = MockOracle::with_generated_rows(2);
    let orchestrator = CacheOrchestrator::from_config(&config, oracle.clone(), Some(shared.clone()));
    let mut ctx = orchestrator.open_context();

    assert_eq!(orchestrator.default_options(), &config.cache_options());

    let first = orchestrator
        .query_with_defaults(&mut ctx, "SELECT Id FROM Account")
        .await
        .unwrap();
    let second = orchestrator
        .query_with_defaults(&mut ctx, "SELECT Id FROM Account")
        .await
        .unwrap();

    assert_eq!(first.status, CacheStatus::Miss);
    assert_eq!(second.status, CacheStatus::HitScoped);
    assert!(shared.is_empty());
    assert_eq!(oracle.call_count(), 1);
}

#[tokio::test]
async fn test_invalidate_with_params_targets_bound_slot() {
    let (orchestrator, oracle, _clock) = create_default();
    let mut ctx = ExecutionContext::new();
    let text = "SELECT Id FROM Account WHERE Industry = 'Energy'";
    let bindings = BTreeMap::from([("industry".to_string(), "'Energy'".to_string())]);
    let options = CacheOptions::default();

    orchestrator
        .query_with_params(&mut ctx, text, &bindings, &options)
        .await
        .unwrap();

    assert!(!orchestrator.invalidate(&mut ctx, text, false).await.unwrap());
    assert!(
        orchestrator
            .invalidate_with_params(&mut ctx, text, &bindings, false)
            .await
            .unwrap()
    );

    let mut other = ExecutionContext::new();
    let result = orchestrator
        .query_with_params(&mut other, text, &bindings, &options)
        .await
        .unwrap();
    assert_eq!(result.status, CacheStatus::Miss);
    assert_eq!(oracle.call_count(), 2);
}

#[tokio::test]
async fn test_empty_result_is_cached() {
    let oracle = MockOracle::new();
    let orchestrator: TestOrchestrator =
        CacheOrchestrator::new(oracle.clone(), Some(MemorySharedStore::new()));
    let mut ctx = ExecutionContext::new();

    let first = orchestrator
        .query(&mut ctx, "SELECT Id FROM Account", &CacheOptions::default())
        .await
        .unwrap();
    let second = orchestrator
        .query(&mut ctx, "SELECT Id FROM Account", &CacheOptions::default())
        .await
        .unwrap();

    assert!(first.rows.is_empty());
    assert_eq!(second.status, CacheStatus::HitScoped);
    assert_eq!(oracle.call_count(), 1);
    let _: Vec<JsonRecord> = second.into_rows();
}
