//! Declarative validation of untyped JSON records.
//!
//! A [`ValidationSchema`] is plain data: an ordered list of field names, each
//! with a [`FieldRule`]. [`validate`] walks the schema and returns at most one
//! message per field. Checks for a field run in a fixed order (required,
//! type, string bounds, pattern, numeric bounds, custom) and a later failing
//! check overwrites an earlier message for the same field.

mod schemas;

pub use schemas::{
    project_schema, project_update_schema, report_schema, report_update_schema,
    require_any, PROJECT_UPDATE_FIELDS, REPORT_UPDATE_FIELDS,
};

use crate::error::{ApiError, ApiResult};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Runtime type a field is expected to carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    /// Whether `value` satisfies this type.
    ///
    /// `Object` also accepts arrays, mirroring `typeof [] === "object"` on the
    /// clients these schemas were written for.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object() || value.is_array(),
            FieldType::Array => value.is_array(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of a custom check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Pass,
    Fail,
    /// Failure with a caller-supplied message
    Message(String),
}

/// Custom predicate attached to a field
pub type CustomCheck = fn(&Value) -> Check;

/// Constraints for one field. Built with the chained setters:
///
/// ```
/// use rapport::validation::FieldRule;
///
/// let rule = FieldRule::string().required().min_length(3).max_length(100);
/// assert!(rule.is_required());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldRule {
    required: bool,
    field_type: Option<FieldType>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
    pattern: Option<Regex>,
    custom: Option<CustomCheck>,
}

impl FieldRule {
    /// Rule with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::of_type(FieldType::String)
    }

    pub fn number() -> Self {
        Self::of_type(FieldType::Number)
    }

    pub fn boolean() -> Self {
        Self::of_type(FieldType::Boolean)
    }

    pub fn object() -> Self {
        Self::of_type(FieldType::Object)
    }

    pub fn array() -> Self {
        Self::of_type(FieldType::Array)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Lengths are measured in UTF-16 code units, so a character outside
    /// the Basic Multilingual Plane counts as two.
    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn custom(mut self, check: CustomCheck) -> Self {
        self.custom = Some(check);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Evaluate this rule for `field`, returning the message that survives.
    fn evaluate(&self, field: &str, value: Option<&Value>) -> Option<String> {
        let value = match value {
            None | Some(Value::Null) => {
                return self.required.then(|| format!("{} is required", field));
            },
            Some(Value::String(s)) if s.is_empty() && self.required => {
                return Some(format!("{} is required", field));
            },
            Some(value) => value,
        };

        if let Some(expected) = self.field_type {
            if !expected.matches(value) {
                return Some(format!("{} must be a {}", field, expected));
            }
        }

        let mut error = None;

        if let Value::String(s) = value {
            let len = s.encode_utf16().count();
            if let Some(min) = self.min_length.filter(|min| len < *min) {
                error = Some(format!("{} must be at least {} characters", field, min));
            }
            if let Some(max) = self.max_length.filter(|max| len > *max) {
                error = Some(format!("{} must be at most {} characters", field, max));
            }
            if let Some(pattern) = &self.pattern {
                if !pattern.is_match(s) {
                    error = Some(format!("{} has an invalid format", field));
                }
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min.filter(|min| n < *min) {
                error = Some(format!("{} must be at least {}", field, format_bound(min)));
            }
            if let Some(max) = self.max.filter(|max| n > *max) {
                error = Some(format!("{} must be at most {}", field, format_bound(max)));
            }
        }

        if let Some(check) = self.custom {
            match check(value) {
                Check::Pass => {},
                Check::Fail => error = Some(format!("{} is invalid", field)),
                Check::Message(message) => error = Some(message),
            }
        }

        error
    }
}

/// Render a numeric bound the way clients wrote it (`3`, not `3.0`).
fn format_bound(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Ordered mapping from field name to rule
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    fields: Vec<(String, FieldRule)>,
}

impl ValidationSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the rule for `name`
    pub fn field(mut self, name: impl Into<String>, rule: FieldRule) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = rule,
            None => self.fields.push((name, rule)),
        }
        self
    }

    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, rule)| rule)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Field-keyed error messages. Empty means the record passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    /// Record `message` for `field`, replacing any earlier message
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when empty, otherwise the errors themselves
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Validate `input` against `schema`. Fields not named in the schema are
/// ignored.
pub fn validate(schema: &ValidationSchema, input: &Map<String, Value>) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    for (field, rule) in schema.fields() {
        if let Some(message) = rule.evaluate(field, input.get(field)) {
            errors.insert(field, message);
        }
    }
    errors
}

/// Validate an arbitrary JSON value. Anything other than an object is
/// treated as an empty record.
pub fn validate_value(schema: &ValidationSchema, input: &Value) -> ValidationErrors {
    match input {
        Value::Object(map) => validate(schema, map),
        _ => validate(schema, &Map::new()),
    }
}

/// Validate `input` and decode it into `T`. Validation failures become a
/// 400 carrying the field errors as details.
pub fn parse_validated<T: DeserializeOwned>(
    schema: &ValidationSchema,
    input: &Value,
) -> ApiResult<T> {
    validate_value(schema, input)
        .into_result()
        .map_err(ApiError::validation)?;
    serde_json::from_value(input.clone()).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// Like [`parse_validated`] for partial updates: additionally at least one
/// of `fields` must carry a value.
pub fn parse_update<T: DeserializeOwned>(
    schema: &ValidationSchema,
    fields: &[&str],
    input: &Value,
) -> ApiResult<T> {
    validate_value(schema, input)
        .into_result()
        .map_err(ApiError::validation)?;
    let empty = Map::new();
    require_any(input.as_object().unwrap_or(&empty), fields)?;
    serde_json::from_value(input.clone()).map_err(|e| ApiError::bad_request(e.to_string()))
}
