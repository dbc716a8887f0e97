//! Table definitions. Creation is idempotent; there are no migrations.

pub const PROJECTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NOT NULL
)";

pub const REPORTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    project_id INTEGER NOT NULL REFERENCES projects(id)
)";

/// Statements run on every open, in order
pub fn statements() -> [&'static str; 2] {
    [PROJECTS_TABLE, REPORTS_TABLE]
}
