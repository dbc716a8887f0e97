//! Test utilities for the rapport crate
//!
//! Seeded in-memory databases and a storage double that fails on demand,
//! shared by unit tests, integration tests and the server's router tests.

use crate::db::{Database, DbError, MutationOutcome, Record, SqliteDatabase};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fresh in-memory database with the tables created
pub async fn memory_database() -> Arc<SqliteDatabase> {
    Arc::new(
        SqliteDatabase::memory()
            .await
            .expect("in-memory database should open"),
    )
}

/// Insert a project row directly and return its id
pub async fn seed_project(db: &dyn Database, name: &str, description: &str) -> i64 {
    db.run_mutation(
        "INSERT INTO projects (name, description) VALUES (?, ?)",
        &[json!(name), json!(description)],
    )
    .await
    .expect("seed project")
    .last_insert_id
}

/// Insert a report row directly and return its id
pub async fn seed_report(db: &dyn Database, text: &str, project_id: i64) -> i64 {
    db.run_mutation(
        "INSERT INTO reports (text, project_id) VALUES (?, ?)",
        &[json!(text), json!(project_id)],
    )
    .await
    .expect("seed report")
    .last_insert_id
}

/// Database wrapper that delegates to an inner database until a configured
/// number of calls have succeeded, then fails every call after that.
///
/// Useful for exercising failures that happen after a request has already
/// done part of its work.
pub struct FailingDatabase {
    inner: Arc<dyn Database>,
    succeed_for: usize,
    calls: AtomicUsize,
}

impl FailingDatabase {
    /// Fail from the first call on
    pub fn always(inner: Arc<dyn Database>) -> Self {
        Self::after(inner, 0)
    }

    /// Let `succeed_for` calls through, then fail
    pub fn after(inner: Arc<dyn Database>, succeed_for: usize) -> Self {
        Self {
            inner,
            succeed_for,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls seen so far, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), DbError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.succeed_for {
            Err(DbError::sql_execution("simulated storage failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl Database for FailingDatabase {
    async fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DbError> {
        self.check()?;
        self.inner.query_all(sql, params).await
    }

    async fn run_mutation(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<MutationOutcome, DbError> {
        self.check()?;
        self.inner.run_mutation(sql, params).await
    }

    async fn get_one(&self, sql: &str, params: &[Value]) -> Result<Option<Record>, DbError> {
        self.check()?;
        self.inner.get_one(sql, params).await
    }
}
