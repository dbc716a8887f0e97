use anyhow::{Context, Result};
use rapport::config::AppConfig;
use rapport::db::{Database, SqliteDatabase};
use rapport::services::{ProjectService, ReportService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub project_service: Arc<ProjectService>,
    pub report_service: Arc<ReportService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, config: AppConfig) -> Self {
        Self {
            project_service: Arc::new(ProjectService::new(db.clone())),
            report_service: Arc::new(ReportService::new(db)),
            config: Arc::new(config),
        }
    }
}

/// Open the configured database. The caller owns the handle and closes it
/// on shutdown.
pub async fn open_database(config: &AppConfig) -> Result<Arc<SqliteDatabase>> {
    let db = if config.uses_memory_database() {
        SqliteDatabase::memory().await
    } else {
        SqliteDatabase::open(&config.database.path).await
    }
    .with_context(|| {
        format!(
            "Failed to open database at {}",
            config.database.path.display()
        )
    })?;
    Ok(Arc::new(db))
}
