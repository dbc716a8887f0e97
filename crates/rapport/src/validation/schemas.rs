use super::{FieldRule, ValidationSchema};
use crate::error::{ApiError, ApiResult};
use serde_json::{Map, Value};

/// Fields a project update must touch at least one of
pub const PROJECT_UPDATE_FIELDS: &[&str] = &["name", "description"];

/// Fields a report update must touch at least one of
pub const REPORT_UPDATE_FIELDS: &[&str] = &["text", "project_id"];

/// Creating a project needs both a name and a description.
pub fn project_schema() -> ValidationSchema {
    ValidationSchema::new()
        .field(
            "name",
            FieldRule::string().required().min_length(3).max_length(100),
        )
        .field("description", FieldRule::string().required())
}

/// Updates are partial: each field is optional but keeps its shape.
pub fn project_update_schema() -> ValidationSchema {
    ValidationSchema::new()
        .field("name", FieldRule::string().min_length(3).max_length(100))
        .field("description", FieldRule::string())
}

pub fn report_schema() -> ValidationSchema {
    ValidationSchema::new()
        .field("text", FieldRule::string().required())
        .field("project_id", FieldRule::string().required())
}

pub fn report_update_schema() -> ValidationSchema {
    ValidationSchema::new()
        .field("text", FieldRule::string())
        .field("project_id", FieldRule::string())
}

/// Fail unless at least one of `fields` carries a non-empty value.
pub fn require_any(input: &Map<String, Value>, fields: &[&str]) -> ApiResult<()> {
    let present = fields
        .iter()
        .any(|field| input.get(*field).is_some_and(is_truthy));
    if present {
        return Ok(());
    }

    let listed = match fields {
        [] => String::new(),
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} or {}", init.join(", "), last),
    };
    Err(ApiError::bad_request(format!(
        "At least one field ({}) is required",
        listed
    )))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn project_name_too_short() {
        let errors = validate(
            &project_schema(),
            &record(json!({ "name": "ab", "description": "d" })),
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("name"), Some("name must be at least 3 characters"));
    }

    #[test]
    fn project_name_too_long() {
        let name = "x".repeat(101);
        let errors = validate(
            &project_schema(),
            &record(json!({ "name": name, "description": "d" })),
        );
        assert_eq!(
            errors.get("name"),
            Some("name must be at most 100 characters")
        );
    }

    #[test]
    fn project_description_has_no_length_bound() {
        let errors = validate(
            &project_schema(),
            &record(json!({ "name": "Apollo", "description": "x" })),
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn report_missing_project_id() {
        let errors = validate(&report_schema(), &record(json!({ "text": "hello" })));
        assert_eq!(errors.get("project_id"), Some("project_id is required"));
        assert_eq!(errors.get("text"), None);
    }

    #[test]
    fn report_project_id_must_be_a_string() {
        let errors = validate(
            &report_schema(),
            &record(json!({ "text": "hello", "project_id": 4 })),
        );
        assert_eq!(errors.get("project_id"), Some("project_id must be a string"));
    }

    #[test]
    fn update_schemas_do_not_require_fields() {
        assert!(validate(&project_update_schema(), &Map::new()).is_empty());
        assert!(validate(&report_update_schema(), &Map::new()).is_empty());
    }

    #[test]
    fn update_schema_still_bounds_name() {
        let errors = validate(&project_update_schema(), &record(json!({ "name": "ab" })));
        assert_eq!(errors.get("name"), Some("name must be at least 3 characters"));
    }

    #[test]
    fn require_any_rejects_empty_update() {
        let err = require_any(&record(json!({ "name": "" })), PROJECT_UPDATE_FIELDS).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.message(),
            "At least one field (name or description) is required"
        );

        let err = require_any(&Map::new(), REPORT_UPDATE_FIELDS).unwrap_err();
        assert_eq!(
            err.message(),
            "At least one field (text or project_id) is required"
        );
    }

    #[test]
    fn require_any_accepts_one_field() {
        assert!(require_any(&record(json!({ "description": "new" })), PROJECT_UPDATE_FIELDS).is_ok());
        assert!(require_any(&record(json!({ "project_id": "2" })), REPORT_UPDATE_FIELDS).is_ok());
    }
}
