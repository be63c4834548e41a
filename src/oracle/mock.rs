use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::error::{OracleError, OracleResult};
use super::{JsonRecord, QueryOracle};

/// One recorded [`MockOracle::execute`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleCall {
    pub query: String,
    pub enforce_access_control: bool,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<OracleCall>,
    responses: HashMap<String, Vec<JsonRecord>>,
    default_rows: Vec<JsonRecord>,
    failure: Option<String>,
}

/// In-memory oracle that records every call.
///
/// Responses are keyed by exact query text; anything else gets the default rows.
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockOracle {
    state: Arc<Mutex<State>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle that answers every query with `rows`.
    pub fn with_rows(rows: Vec<JsonRecord>) -> Self {
        let oracle = Self::new();
        oracle.state.lock().default_rows = rows;
        oracle
    }

    /// Oracle that answers every query with `count` generated records.
    pub fn with_generated_rows(count: usize) -> Self {
        let rows = (0..count)
            .map(|i| {
                let mut record = JsonRecord::new();
                record.insert("Id".to_string(), format!("{:03}", i + 1).into());
                record
            })
            .collect();
        Self::with_rows(rows)
    }

    /// Sets the rows returned for one exact query text.
    pub fn respond_to(&self, query: &str, rows: Vec<JsonRecord>) {
        self.state.lock().responses.insert(query.to_string(), rows);
    }

    /// Makes every subsequent call fail with `detail`.
    pub fn fail_with(&self, detail: &str) {
        self.state.lock().failure = Some(detail.to_string());
    }

    pub fn recover(&self) {
        self.state.lock().failure = None;
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    pub fn calls(&self) -> Vec<OracleCall> {
        self.state.lock().calls.clone()
    }

    pub fn last_call(&self) -> Option<OracleCall> {
        self.state.lock().calls.last().cloned()
    }
}

impl QueryOracle for MockOracle {
    type Record = JsonRecord;

    async fn execute(
        &self,
        query: &str,
        enforce_access_control: bool,
    ) -> OracleResult<Vec<JsonRecord>> {
        let mut state = self.state.lock();
        state.calls.push(OracleCall {
            query: query.to_string(),
            enforce_access_control,
        });

        if let Some(detail) = &state.failure {
            return Err(OracleError::new(detail.clone()));
        }

        Ok(state
            .responses
            .get(query)
            .unwrap_or(&state.default_rows)
            .clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_oracle_records_calls() {
        let oracle = MockOracle::with_generated_rows(2);

        let rows = oracle.execute("SELECT Id FROM Account", true).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Id"], "001");
        assert_eq!(oracle.call_count(), 1);
        assert_eq!(
            oracle.last_call(),
            Some(OracleCall {
                query: "SELECT Id FROM Account".to_string(),
                enforce_access_control: true,
            })
        );
    }

    #[tokio::test]
    async fn test_mock_oracle_per_query_response() {
        let oracle = MockOracle::new();
        let mut record = JsonRecord::new();
        record.insert("Name".to_string(), "Acme".into());
        oracle.respond_to("SELECT Name FROM Account", vec![record]);

        assert_eq!(
            oracle
                .execute("SELECT Name FROM Account", false)
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(
            oracle
                .execute("SELECT Id FROM Contact", false)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_mock_oracle_failure_toggle() {
        let oracle = MockOracle::with_generated_rows(1);
        oracle.fail_with("INVALID_FIELD: No such column 'Foo'");

        let err = oracle.execute("SELECT Foo FROM Account", false).await;
        assert_eq!(
            err,
            Err(OracleError::new("INVALID_FIELD: No such column 'Foo'"))
        );

        oracle.recover();
        assert!(oracle.execute("SELECT Id FROM Account", false).await.is_ok());
        assert_eq!(oracle.call_count(), 2);
    }
}
