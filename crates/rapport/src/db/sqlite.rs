use super::{schema, Database, DbError, MutationOutcome, Record};
use libsql::params::Params;
use libsql::{Builder, Connection};
use serde_json::{Number, Value};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

const MEMORY_PATH: &str = ":memory:";

/// Embedded SQLite database backed by libsql.
///
/// Holds a single connection for its whole life: it is opened once at
/// startup, shared by reference, and released by [`SqliteDatabase::close`].
/// Using the handle after `close` fails with [`DbError::Closed`].
pub struct SqliteDatabase {
    path: PathBuf,
    handle: RwLock<Option<Handle>>,
    // Mutations and their last-insert id read must not interleave
    write_lock: Mutex<()>,
}

struct Handle {
    // Keeps the database alive for as long as the connection is in use
    _db: libsql::Database,
    conn: Connection,
}

impl SqliteDatabase {
    /// Open (or create) the database file at `path` and ensure the tables exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        Self::build(path).await
    }

    /// Private in-memory database, mostly for tests
    pub async fn memory() -> Result<Self, DbError> {
        Self::build(PathBuf::from(MEMORY_PATH)).await
    }

    async fn build(path: PathBuf) -> Result<Self, DbError> {
        let db = Builder::new_local(&path)
            .build()
            .await
            .map_err(|e| DbError::open(path.clone(), e))?;
        let conn = db
            .connect()
            .map_err(|e| DbError::open(path.clone(), e))?;

        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DbError::schema(format!("foreign keys: {}", e)))?;

        for statement in schema::statements() {
            conn.execute(statement, ())
                .await
                .map_err(|e| DbError::schema(e.to_string()))?;
        }

        tracing::info!(path = %path.display(), "database connection established");

        Ok(Self {
            path,
            handle: RwLock::new(Some(Handle { _db: db, conn })),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the connection. Idempotent.
    pub async fn close(&self) {
        if self.handle.write().await.take().is_some() {
            tracing::info!(path = %self.path.display(), "database connection closed");
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.handle.read().await.is_none()
    }

    async fn connection(&self) -> Result<Connection, DbError> {
        self.handle
            .read()
            .await
            .as_ref()
            .map(|handle| handle.conn.clone())
            .ok_or(DbError::Closed)
    }
}

#[async_trait::async_trait]
impl Database for SqliteDatabase {
    async fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Record>, DbError> {
        let conn = self.connection().await?;
        let mut rows = conn.query(sql, to_params(params)).await.map_err(|e| {
            tracing::error!(error = %e, sql, "database query error");
            DbError::sql_execution(format!("query '{}': {}", sql, e))
        })?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_record(&row)?);
        }
        Ok(records)
    }

    async fn run_mutation(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<MutationOutcome, DbError> {
        let conn = self.connection().await?;
        let _guard = self.write_lock.lock().await;
        let rows_affected = conn.execute(sql, to_params(params)).await.map_err(|e| {
            tracing::error!(error = %e, sql, "database run error");
            DbError::sql_execution(format!("run '{}': {}", sql, e))
        })?;

        Ok(MutationOutcome {
            last_insert_id: conn.last_insert_rowid(),
            rows_affected,
        })
    }

    async fn get_one(&self, sql: &str, params: &[Value]) -> Result<Option<Record>, DbError> {
        let conn = self.connection().await?;
        let mut rows = conn.query(sql, to_params(params)).await.map_err(|e| {
            tracing::error!(error = %e, sql, "database get error");
            DbError::sql_execution(format!("get '{}': {}", sql, e))
        })?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_record(&row)?)),
            None => Ok(None),
        }
    }
}

fn to_params(params: &[Value]) -> Params {
    if params.is_empty() {
        return Params::None;
    }
    Params::Positional(params.iter().map(to_sql_value).collect())
}

fn to_sql_value(value: &Value) -> libsql::Value {
    match value {
        Value::Null => libsql::Value::Null,
        Value::Bool(b) => libsql::Value::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => libsql::Value::Integer(i),
            None => libsql::Value::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => libsql::Value::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => libsql::Value::Text(value.to_string()),
    }
}

fn from_sql_value(value: libsql::Value) -> Value {
    match value {
        libsql::Value::Null => Value::Null,
        libsql::Value::Integer(i) => Value::from(i),
        libsql::Value::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        libsql::Value::Text(s) => Value::String(s),
        libsql::Value::Blob(bytes) => Value::from(bytes),
    }
}

fn row_to_record(row: &libsql::Row) -> Result<Record, DbError> {
    let mut record = Record::new();
    for idx in 0..row.column_count() {
        let name = row
            .column_name(idx)
            .ok_or_else(|| DbError::sql_execution(format!("column {} has no name", idx)))?
            .to_string();
        record.insert(name, from_sql_value(row.get_value(idx)?));
    }
    Ok(record)
}
