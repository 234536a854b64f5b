//! Explicit field contracts and the validation routine that checks payloads against them.
//!
//! A model describes its writable fields once, as a static [`ModelSchema`]. Incoming
//! JSON payloads are checked field by field; the outcome is either a normalized map of
//! the accepted values or a [`ValidationErrors`] report naming every failing field.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Key under which errors that do not belong to a single field are reported.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Largest value accepted by a [`FieldKind::SmallUint`] field.
pub const SMALL_UINT_MAX: i64 = 32767;

/// Wire type and constraints of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-blank text, optionally bounded in characters.
    Text { max_len: Option<usize> },
    Boolean,
    /// Calendar date in `YYYY-MM-DD` form.
    Date,
    /// Integer in `0..=32767`.
    SmallUint,
    /// Identity key of a record of the named model.
    Reference { target: &'static str },
}

/// One entry of a model's field contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn text(name: &'static str, max_len: Option<usize>) -> Self {
        Self {
            name,
            kind: FieldKind::Text { max_len },
            required: true,
        }
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Boolean,
            required: true,
        }
    }

    pub const fn date(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Date,
            required: true,
        }
    }

    pub const fn small_uint(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::SmallUint,
            required: true,
        }
    }

    pub const fn reference(name: &'static str, target: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Reference { target },
            required: true,
        }
    }

    /// Name of the referenced model, if this field is a reference.
    pub fn target(&self) -> Option<&'static str> {
        match self.kind {
            FieldKind::Reference { target } => Some(target),
            _ => None,
        }
    }
}

/// Ordered field contract of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSchema {
    /// Model name (`"Subject"`, `"Student"`, ...).
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl ModelSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn references(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.target().is_some())
    }
}

/// How strictly a payload is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every required field must be present (create, full update).
    Full,
    /// Only the fields present are checked (partial update).
    Partial,
}

/// Per-field validation report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// `Ok(value)` when nothing was reported, `Err(self)` otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", field, messages.join(" "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Check `payload` against `schema`.
///
/// Unknown keys (including a client-supplied `id`) are ignored. On success the returned
/// map holds only the schema's fields that were present, in normalized form: text
/// trimmed, dates as `YYYY-MM-DD`, integers as numbers, references as key strings.
pub fn validate(
    schema: &ModelSchema,
    payload: &Value,
    mode: ValidationMode,
) -> Result<Map<String, Value>, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let Some(object) = payload.as_object() else {
        errors.add(
            NON_FIELD_ERRORS,
            format!(
                "Invalid data. Expected a dictionary, but got {}.",
                json_type_name(payload)
            ),
        );
        return Err(errors);
    };

    let mut accepted = Map::new();
    for spec in schema.fields {
        match object.get(spec.name) {
            None => {
                if mode == ValidationMode::Full && spec.required {
                    errors.add(spec.name, "This field is required.");
                }
            }
            Some(Value::Null) => errors.add(spec.name, "This field may not be null."),
            Some(raw) => match check_value(spec.kind, raw) {
                Ok(value) => {
                    accepted.insert(spec.name.to_string(), value);
                }
                Err(message) => errors.add(spec.name, message),
            },
        }
    }

    errors.into_result(accepted)
}

fn check_value(kind: FieldKind, raw: &Value) -> Result<Value, String> {
    match kind {
        FieldKind::Text { max_len } => {
            let text = match raw {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return Err("Not a valid string.".to_string()),
            };
            if text.is_empty() {
                return Err("This field may not be blank.".to_string());
            }
            if let Some(max) = max_len {
                if text.chars().count() > max {
                    return Err(format!(
                        "Ensure this field has no more than {} characters.",
                        max
                    ));
                }
            }
            Ok(Value::String(text))
        }
        FieldKind::Boolean => match raw {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Number(n) if n.as_i64() == Some(1) => Ok(Value::Bool(true)),
            Value::Number(n) if n.as_i64() == Some(0) => Ok(Value::Bool(false)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
                _ => Err("Must be a valid boolean.".to_string()),
            },
            _ => Err("Must be a valid boolean.".to_string()),
        },
        FieldKind::Date => {
            let parsed = raw
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
            match parsed {
                Some(date) => Ok(Value::String(date.format("%Y-%m-%d").to_string())),
                None => Err("Date has wrong format. Use YYYY-MM-DD.".to_string()),
            }
        }
        FieldKind::SmallUint => {
            let parsed = match raw {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            };
            match parsed {
                None => Err("A valid integer is required.".to_string()),
                Some(v) if v < 0 => {
                    Err("Ensure this value is greater than or equal to 0.".to_string())
                }
                Some(v) if v > SMALL_UINT_MAX => Err(format!(
                    "Ensure this value is less than or equal to {}.",
                    SMALL_UINT_MAX
                )),
                Some(v) => Ok(Value::from(v)),
            }
        }
        FieldKind::Reference { .. } => match raw {
            Value::String(s) => match Uuid::parse_str(s.trim()) {
                Ok(uuid) => Ok(Value::String(uuid.to_string())),
                Err(_) => Err(format!("Invalid pk \"{}\" - object does not exist.", s)),
            },
            other => Err(format!(
                "Incorrect type. Expected pk value, received {}.",
                json_type_name(other)
            )),
        },
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
