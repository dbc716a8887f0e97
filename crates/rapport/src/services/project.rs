use super::types::{
    non_empty, parse_id, Deleted, NewProject, Project, ProjectUpdate, ProjectWithReports, Report,
};
use super::{decode, decode_all};
use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use serde_json::{json, Value};
use std::sync::Arc;

const NOT_FOUND: &str = "Project not found";

/// Service for project CRUD operations
pub struct ProjectService {
    db: Arc<dyn Database>,
}

impl ProjectService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// All projects, in storage order
    pub async fn list(&self) -> ApiResult<Vec<Project>> {
        let records = self.db.query_all("SELECT * FROM projects", &[]).await?;
        Ok(decode_all(records)?)
    }

    /// A project with its reports attached
    pub async fn get(&self, id: &str) -> ApiResult<ProjectWithReports> {
        let project = self.find(id).await?.ok_or_else(not_found)?;

        let records = self
            .db
            .query_all(
                "SELECT * FROM reports WHERE project_id = ?",
                &[json!(project.id)],
            )
            .await?;
        let reports: Vec<Report> = decode_all(records)?;

        Ok(ProjectWithReports { project, reports })
    }

    /// Insert a project and return the stored row
    pub async fn create(&self, new: NewProject) -> ApiResult<Project> {
        let outcome = self
            .db
            .run_mutation(
                "INSERT INTO projects (name, description) VALUES (?, ?)",
                &[json!(new.name), json!(new.description)],
            )
            .await?;

        let project = self
            .fetch(outcome.last_insert_id)
            .await?
            .ok_or_else(|| ApiError::internal().with_diagnostic("created project vanished"))?;

        tracing::info!(id = project.id, name = %project.name, "project created");
        Ok(project)
    }

    /// Change the provided, non-empty fields of a project
    pub async fn update(&self, id: &str, update: ProjectUpdate) -> ApiResult<Project> {
        let name = non_empty(update.name);
        let description = non_empty(update.description);
        if name.is_none() && description.is_none() {
            return Err(ApiError::bad_request(
                "At least one field (name or description) is required",
            ));
        }

        let existing = self.find(id).await?.ok_or_else(not_found)?;

        let mut assignments = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        if let Some(name) = name {
            assignments.push("name = ?");
            params.push(json!(name));
        }
        if let Some(description) = description {
            assignments.push("description = ?");
            params.push(json!(description));
        }
        params.push(json!(existing.id));

        let sql = format!(
            "UPDATE projects SET {} WHERE id = ?",
            assignments.join(", ")
        );
        self.db.run_mutation(&sql, &params).await?;

        let project = self.fetch(existing.id).await?.ok_or_else(not_found)?;
        tracing::info!(id = project.id, "project updated");
        Ok(project)
    }

    /// Delete a project and every report attached to it
    pub async fn remove(&self, id: &str) -> ApiResult<Deleted> {
        let existing = self.find(id).await?.ok_or_else(not_found)?;

        let reports = self
            .db
            .run_mutation(
                "DELETE FROM reports WHERE project_id = ?",
                &[json!(existing.id)],
            )
            .await?;
        self.db
            .run_mutation("DELETE FROM projects WHERE id = ?", &[json!(existing.id)])
            .await?;

        tracing::info!(
            id = existing.id,
            reports_removed = reports.rows_affected,
            "project deleted"
        );
        Ok(Deleted::new(
            "Project and associated reports deleted successfully",
        ))
    }

    /// Whether a project with this id exists
    pub async fn exists(&self, id: &str) -> ApiResult<bool> {
        Ok(self.find(id).await?.is_some())
    }

    async fn find(&self, id: &str) -> ApiResult<Option<Project>> {
        match parse_id(id) {
            Some(id) => self.fetch(id).await,
            None => Ok(None),
        }
    }

    async fn fetch(&self, id: i64) -> ApiResult<Option<Project>> {
        let record = self
            .db
            .get_one("SELECT * FROM projects WHERE id = ?", &[json!(id)])
            .await?;
        Ok(record.map(decode).transpose()?)
    }
}

fn not_found() -> ApiError {
    ApiError::not_found(NOT_FOUND)
}
