//! Validation of JSON values against a [`Schema`].

use serde_json::Value;
use thiserror::Error;

use super::{FieldType, Schema};

/// The first way in which a value fails to match its schema.
///
/// `path` uses `$` for the root, `.name` for fields and `[i]` for array
/// elements, e.g. `$.tourSteps[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// The value at `path` has the wrong JSON type.
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A required field is absent or `null`.
    #[error("{path}: missing required field")]
    MissingField { path: String },

    /// The object carries a field the schema does not declare.
    #[error("{path}: unexpected field")]
    UnexpectedField { path: String },

    /// Raw model text could not be parsed as JSON at all.
    #[error("response is not valid JSON: {0}")]
    Unparseable(String),
}

impl Schema {
    /// Validate `value` against this schema.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaViolation`] found, walking fields in
    /// declaration order.
    pub fn validate(&self, value: &Value) -> Result<(), SchemaViolation> {
        validate_object(self, value, "$")
    }
}

fn validate_object(schema: &Schema, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    let Value::Object(map) = value else {
        return Err(mismatch(path, "object", value));
    };

    for field in schema.fields() {
        let field_path = format!("{path}.{}", field.name);
        match map.get(&field.name) {
            None | Some(Value::Null) if field.optional => {}
            None | Some(Value::Null) => {
                return Err(SchemaViolation::MissingField { path: field_path });
            }
            Some(v) => validate_type(&field.ty, v, &field_path)?,
        }
    }

    if let Some(extra) = map.keys().find(|key| schema.get(key).is_none()) {
        return Err(SchemaViolation::UnexpectedField {
            path: format!("{path}.{extra}"),
        });
    }

    Ok(())
}

fn validate_type(ty: &FieldType, value: &Value, path: &str) -> Result<(), SchemaViolation> {
    match (ty, value) {
        (FieldType::String, Value::String(_))
        | (FieldType::Number, Value::Number(_))
        | (FieldType::Boolean, Value::Bool(_)) => Ok(()),
        (FieldType::Array(item), Value::Array(elements)) => {
            for (i, element) in elements.iter().enumerate() {
                validate_type(item, element, &format!("{path}[{i}]"))?;
            }
            Ok(())
        }
        (FieldType::Object(schema), _) => validate_object(schema, value, path),
        _ => Err(mismatch(path, ty.name(), value)),
    }
}

fn mismatch(path: &str, expected: &'static str, found: &Value) -> SchemaViolation {
    SchemaViolation::TypeMismatch {
        path: path.to_string(),
        expected,
        found: json_type_name(found),
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
