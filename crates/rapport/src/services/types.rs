use serde::{Deserialize, Serialize};

/// A project row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// A project together with its reports, as returned by the detail endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectWithReports {
    #[serde(flatten)]
    pub project: Project,
    pub reports: Vec<Report>,
}

/// A report row. Reports always belong to exactly one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub text: String,
    pub project_id: i64,
}

/// Body of a project creation request, after validation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: String,
}

/// Partial project update. Empty strings are treated as "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReport {
    pub text: String,
    pub project_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReportUpdate {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Confirmation body for deletions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub message: String,
}

impl Deleted {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Parse a client-supplied id. Ids that are not integers can never match a
/// row, so callers map `None` to their not-found error.
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Keep a provided value only when it is non-empty
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn project_with_reports_flattens_project_fields() {
        let detail = ProjectWithReports {
            project: Project {
                id: 1,
                name: "Apollo".to_string(),
                description: "Moon".to_string(),
            },
            reports: vec![Report {
                id: 7,
                text: "launch".to_string(),
                project_id: 1,
            }],
        };

        assert_eq!(
            serde_json::to_value(&detail).unwrap(),
            json!({
                "id": 1,
                "name": "Apollo",
                "description": "Moon",
                "reports": [{ "id": 7, "text": "launch", "project_id": 1 }]
            })
        );
    }

    #[test]
    fn parse_id_accepts_integers_only() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id(" 7 "), Some(7));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id("1.5"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn updates_default_to_nothing() {
        let update: ProjectUpdate = serde_json::from_value(json!({})).unwrap();
        assert_eq!(update, ProjectUpdate::default());

        let update: ReportUpdate = serde_json::from_value(json!({ "text": "t" })).unwrap();
        assert_eq!(update.text.as_deref(), Some("t"));
        assert!(update.project_id.is_none());
    }

    #[test]
    fn non_empty_drops_blank_values() {
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("x".to_string())), Some("x".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
