//! The query oracle: the external engine that actually executes queries.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{OracleError, OracleResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockOracle, OracleCall};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Untyped record for oracles that return plain JSON objects.
pub type JsonRecord = serde_json::Map<String, serde_json::Value>;

/// Executes raw query text and returns typed records.
///
/// The record type is chosen by the oracle; the cache only needs to round-trip it
/// through JSON. Timeouts and cancellation are the oracle's concern.
pub trait QueryOracle: Send + Sync {
    type Record: Serialize + DeserializeOwned + Send + Sync + 'static;

    fn execute(
        &self,
        query: &str,
        enforce_access_control: bool,
    ) -> impl std::future::Future<Output = OracleResult<Vec<Self::Record>>> + Send;
}
