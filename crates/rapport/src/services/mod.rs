pub mod project;
pub mod report;
pub mod types;

pub use project::ProjectService;
pub use report::ReportService;
pub use types::{
    parse_id, Deleted, NewProject, NewReport, Project, ProjectUpdate, ProjectWithReports, Report,
    ReportUpdate,
};

use crate::db::{DbError, Record};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode one row into its typed form
fn decode<T: DeserializeOwned>(record: Record) -> Result<T, DbError> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

fn decode_all<T: DeserializeOwned>(records: Vec<Record>) -> Result<Vec<T>, DbError> {
    records.into_iter().map(decode).collect()
}
