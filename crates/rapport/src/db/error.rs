use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("cannot open database {path}: {source}")]
    Open {
        path: PathBuf,
        source: libsql::Error,
    },

    #[error("cannot create database directory: {0}")]
    Directory(#[from] std::io::Error),

    /// Table creation or pragma setup failed
    #[error("schema setup failed: {0}")]
    Schema(String),

    #[error(transparent)]
    Libsql(#[from] libsql::Error),

    #[error("SQL execution failed: {context}")]
    SqlExecution { context: String },

    /// A row did not have the shape of the requested type
    #[error("row decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("database connection is closed")]
    Closed,
}

impl DbError {
    pub fn open(path: impl Into<PathBuf>, source: libsql::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecution {
            context: context.into(),
        }
    }
}
