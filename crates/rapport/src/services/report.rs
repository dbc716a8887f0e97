use super::types::{non_empty, parse_id, Deleted, NewReport, Report, ReportUpdate};
use super::{decode, decode_all};
use crate::analysis;
use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use serde_json::{json, Value};
use std::sync::Arc;

/// Service for report CRUD operations and text queries
pub struct ReportService {
    db: Arc<dyn Database>,
}

impl ReportService {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> ApiResult<Vec<Report>> {
        let records = self.db.query_all("SELECT * FROM reports", &[]).await?;
        Ok(decode_all(records)?)
    }

    /// Reports in which some word appears at least three times
    pub async fn with_repeated_words(&self) -> ApiResult<Vec<Report>> {
        let reports = self.list().await?;
        let matching = analysis::filter_repeated(&reports);
        tracing::debug!(
            scanned = reports.len(),
            matched = matching.len(),
            "repeated word scan"
        );
        Ok(matching)
    }

    pub async fn get(&self, id: &str) -> ApiResult<Report> {
        self.find(id).await?.ok_or_else(report_not_found)
    }

    /// Insert a report for an existing project
    pub async fn create(&self, new: NewReport) -> ApiResult<Report> {
        let project_id = self.require_project(&new.project_id).await?;

        let outcome = self
            .db
            .run_mutation(
                "INSERT INTO reports (text, project_id) VALUES (?, ?)",
                &[json!(new.text), json!(project_id)],
            )
            .await?;

        let report = self
            .fetch(outcome.last_insert_id)
            .await?
            .ok_or_else(|| ApiError::internal().with_diagnostic("created report vanished"))?;

        tracing::info!(id = report.id, project_id, "report created");
        Ok(report)
    }

    /// Change the provided, non-empty fields of a report. Moving a report
    /// requires the target project to exist.
    pub async fn update(&self, id: &str, update: ReportUpdate) -> ApiResult<Report> {
        let text = non_empty(update.text);
        let project_id = non_empty(update.project_id);
        if text.is_none() && project_id.is_none() {
            return Err(ApiError::bad_request(
                "At least one field (text or project_id) is required",
            ));
        }

        let existing = self.find(id).await?.ok_or_else(report_not_found)?;

        let project_id = match project_id {
            Some(raw) => Some(self.require_project(&raw).await?),
            None => None,
        };

        let mut assignments = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        if let Some(text) = text {
            assignments.push("text = ?");
            params.push(json!(text));
        }
        if let Some(project_id) = project_id {
            assignments.push("project_id = ?");
            params.push(json!(project_id));
        }
        params.push(json!(existing.id));

        let sql = format!("UPDATE reports SET {} WHERE id = ?", assignments.join(", "));
        self.db.run_mutation(&sql, &params).await?;

        let report = self.fetch(existing.id).await?.ok_or_else(report_not_found)?;
        tracing::info!(id = report.id, "report updated");
        Ok(report)
    }

    pub async fn remove(&self, id: &str) -> ApiResult<Deleted> {
        let existing = self.find(id).await?.ok_or_else(report_not_found)?;
        self.db
            .run_mutation("DELETE FROM reports WHERE id = ?", &[json!(existing.id)])
            .await?;

        tracing::info!(id = existing.id, "report deleted");
        Ok(Deleted::new("Report deleted successfully"))
    }

    /// Resolve a client-supplied project id, failing with 404 if no such
    /// project exists
    async fn require_project(&self, raw: &str) -> ApiResult<i64> {
        let Some(id) = parse_id(raw) else {
            return Err(project_not_found());
        };
        let project = self
            .db
            .get_one("SELECT id FROM projects WHERE id = ?", &[json!(id)])
            .await?;
        match project {
            Some(_) => Ok(id),
            None => Err(project_not_found()),
        }
    }

    async fn find(&self, id: &str) -> ApiResult<Option<Report>> {
        match parse_id(id) {
            Some(id) => self.fetch(id).await,
            None => Ok(None),
        }
    }

    async fn fetch(&self, id: i64) -> ApiResult<Option<Report>> {
        let record = self
            .db
            .get_one("SELECT * FROM reports WHERE id = ?", &[json!(id)])
            .await?;
        Ok(record.map(decode).transpose()?)
    }
}

fn report_not_found() -> ApiError {
    ApiError::not_found("Report not found")
}

fn project_not_found() -> ApiError {
    ApiError::not_found("Project not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbError, MockDatabase, MutationOutcome, SqliteDatabase};
    use crate::error::ErrorKind;

    async fn service_with_project() -> ReportService {
        let db = SqliteDatabase::memory().await.unwrap();
        db.run_mutation(
            "INSERT INTO projects (name, description) VALUES (?, ?)",
            &[json!("Apollo"), json!("Moon")],
        )
        .await
        .unwrap();
        ReportService::new(Arc::new(db))
    }

    fn new_report(text: &str, project_id: &str) -> NewReport {
        NewReport {
            text: text.to_string(),
            project_id: project_id.to_string(),
        }
    }

    #[tokio::test]
    async fn create_links_report_to_project() {
        let svc = service_with_project().await;
        let report = svc.create(new_report("liftoff", "1")).await.unwrap();
        assert_eq!(report.id, 1);
        assert_eq!(report.project_id, 1);
        assert_eq!(svc.get("1").await.unwrap(), report);
    }

    #[tokio::test]
    async fn create_for_missing_project_is_not_found() {
        let svc = service_with_project().await;
        for project_id in ["2", "apollo"] {
            let err = svc.create(new_report("text", project_id)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(err.message(), "Project not found");
        }
        assert!(svc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_missing_report_is_not_found() {
        let svc = service_with_project().await;
        let err = svc.get("5").await.unwrap_err();
        assert_eq!(err.message(), "Report not found");
    }

    #[tokio::test]
    async fn repeated_words_filters_and_keeps_order() {
        let svc = service_with_project().await;
        svc.create(new_report("the cat the dog the bird", "1")).await.unwrap();
        svc.create(new_report("a b c a b", "1")).await.unwrap();
        svc.create(new_report("Hi! Hi, hi.", "1")).await.unwrap();

        let ids: Vec<i64> = svc
            .with_repeated_words()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn update_text_only() {
        let svc = service_with_project().await;
        svc.create(new_report("draft", "1")).await.unwrap();

        let updated = svc
            .update(
                "1",
                ReportUpdate {
                    text: Some("final".to_string()),
                    project_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.text, "final");
        assert_eq!(updated.project_id, 1);
    }

    #[tokio::test]
    async fn update_to_missing_project_is_not_found() {
        let svc = service_with_project().await;
        svc.create(new_report("draft", "1")).await.unwrap();

        let err = svc
            .update(
                "1",
                ReportUpdate {
                    text: Some("moved".to_string()),
                    project_id: Some("77".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Project not found");
        assert_eq!(svc.get("1").await.unwrap().text, "draft");
    }

    #[tokio::test]
    async fn update_missing_report_is_checked_before_project() {
        let svc = service_with_project().await;
        let err = svc
            .update(
                "9",
                ReportUpdate {
                    text: None,
                    project_id: Some("77".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Report not found");
    }

    #[tokio::test]
    async fn update_without_fields_is_bad_request() {
        let svc = service_with_project().await;
        let err = svc
            .update(
                "1",
                ReportUpdate {
                    text: Some(String::new()),
                    project_id: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(
            err.message(),
            "At least one field (text or project_id) is required"
        );
    }

    #[tokio::test]
    async fn remove_deletes_report() {
        let svc = service_with_project().await;
        svc.create(new_report("draft", "1")).await.unwrap();

        let deleted = svc.remove("1").await.unwrap();
        assert_eq!(deleted.message, "Report deleted successfully");
        assert_eq!(svc.get("1").await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(svc.remove("1").await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn failure_after_insert_is_reported_once_as_internal() {
        let mut db = MockDatabase::new();
        db.expect_get_one()
            .withf(|sql, _| sql.contains("FROM projects"))
            .returning(|_, _| {
                let mut record = crate::db::Record::new();
                record.insert("id".to_string(), json!(1));
                Ok(Some(record))
            });
        db.expect_run_mutation().times(1).returning(|_, _| {
            Ok(MutationOutcome {
                last_insert_id: 10,
                rows_affected: 1,
            })
        });
        db.expect_get_one()
            .withf(|sql, _| sql.contains("FROM reports"))
            .returning(|_, _| Err(DbError::sql_execution("database is locked")));
        let svc = ReportService::new(Arc::new(db));

        let err = svc.create(new_report("text", "1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.status_code(), 500);
    }
}
