pub mod error;
pub mod schema;
pub mod sqlite;

pub use error::DbError;
pub use sqlite::SqliteDatabase;

use serde_json::{Map, Value};

/// A result row keyed by column name
pub type Record = Map<String, Value>;

/// What a mutating statement reports back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Row id of the last inserted row on this connection
    pub last_insert_id: i64,
    pub rows_affected: u64,
}

/// Relational storage consumed by the services.
///
/// Parameters are positional (`?`) and passed as JSON values.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    /// Run a query and collect every row
    async fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DbError>;

    /// Run an INSERT/UPDATE/DELETE
    async fn run_mutation(&self, sql: &str, params: &[Value])
        -> Result<MutationOutcome, DbError>;

    /// Run a query and return its first row, if any
    async fn get_one(&self, sql: &str, params: &[Value]) -> Result<Option<Record>, DbError>;
}
