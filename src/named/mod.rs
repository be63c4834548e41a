//! Named queries: stored parameterized templates bound and run through the cache.

pub mod definition;
pub mod error;
pub mod params;
pub mod registry;
pub mod resolver;
pub mod sanitize;
mod template;


pub use definition::NamedQueryDefinition;
pub use error::{NamedQueryError, NamedQueryResult};
pub use params::ParamValue;
pub use registry::NamedQueryRegistry;
pub use resolver::{BoundQuery, NamedQueryResolver};
pub use sanitize::{escape_literal, quote_literal};
