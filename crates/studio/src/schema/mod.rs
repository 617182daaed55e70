//! Declarative schemas for flow inputs, outputs and tool arguments.
//!
//! A [`Schema`] is an ordered list of named fields. The same schema drives
//! three things: validation of values crossing the model boundary, the JSON
//! Schema handed to the model as `responseSchema` or tool `parameters`, and
//! the field guide appended to every prompt.

pub mod registry;
pub mod validate;

pub use registry::{OperationDef, OperationSpec, Registry};
pub use validate::SchemaViolation;

use std::collections::HashSet;

use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::prompt::TemplateError;

/// Errors raised while registering operations.
///
/// These are startup misconfigurations; the binaries treat them as fatal.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// An operation with the same name is already registered.
    #[error("operation already registered: {0}")]
    DuplicateOperation(String),

    /// A schema is structurally invalid.
    #[error("invalid schema for {owner}: {reason}")]
    InvalidSchema {
        /// Operation or tool that owns the schema.
        owner: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The prompt template is malformed or references undeclared fields.
    #[error("invalid prompt template for {operation}: {source}")]
    InvalidTemplate {
        /// Operation that owns the template.
        operation: String,
        /// Underlying template problem.
        #[source]
        source: TemplateError,
    },
}

/// Semantic type of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array(Box<FieldType>),
    Object(Schema),
}

impl FieldType {
    /// Array whose elements are all of `item` type.
    #[must_use]
    pub fn array_of(item: Self) -> Self {
        Self::Array(Box::new(item))
    }

    /// Lowercase type name as used in JSON Schema.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    fn to_json_schema(&self, dialect: SchemaDialect) -> Value {
        match self {
            Self::Array(item) => json!({
                "type": dialect.type_name(self),
                "items": item.to_json_schema(dialect),
            }),
            Self::Object(schema) => schema.to_json_schema(dialect),
            _ => json!({ "type": dialect.type_name(self) }),
        }
    }
}

/// A single named field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    pub optional: bool,
    /// Natural-language description shown to the model.
    pub description: String,
}

/// Which flavour of JSON Schema to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDialect {
    /// Standard JSON Schema with lowercase type names.
    JsonSchema,
    /// Gemini's OpenAPI subset: uppercase type names, `propertyOrdering`,
    /// `nullable` for optional fields.
    Gemini,
}

impl SchemaDialect {
    const fn type_name(self, ty: &FieldType) -> &'static str {
        match self {
            Self::JsonSchema => ty.name(),
            Self::Gemini => match ty {
                FieldType::String => "STRING",
                FieldType::Number => "NUMBER",
                FieldType::Boolean => "BOOLEAN",
                FieldType::Array(_) => "ARRAY",
                FieldType::Object(_) => "OBJECT",
            },
        }
    }
}

/// Ordered object schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Create an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a required field.
    #[must_use]
    pub fn field(self, name: &str, ty: FieldType, description: &str) -> Self {
        self.push(name, ty, false, description)
    }

    /// Append an optional field. It may be absent or `null`.
    #[must_use]
    pub fn optional_field(self, name: &str, ty: FieldType, description: &str) -> Self {
        self.push(name, ty, true, description)
    }

    fn push(mut self, name: &str, ty: FieldType, optional: bool, description: &str) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            ty,
            optional,
            description: description.to_string(),
        });
        self
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check structural validity: non-empty, unique field names at every
    /// level and no empty nested objects.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::InvalidSchema` naming `owner` on the first problem.
    pub fn check(&self, owner: &str) -> Result<(), SchemaError> {
        self.check_at(owner, "$")
    }

    fn check_at(&self, owner: &str, path: &str) -> Result<(), SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidSchema {
            owner: owner.to_string(),
            reason,
        };

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(invalid(format!("{path}: field with empty name")));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(invalid(format!(
                    "{path}: duplicate field '{}'",
                    field.name
                )));
            }
            check_type(&field.ty, owner, &format!("{path}.{}", field.name))?;
        }
        Ok(())
    }

    /// Export as a JSON Schema object.
    #[must_use]
    pub fn to_json_schema(&self, dialect: SchemaDialect) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        let mut ordering = Vec::new();

        for field in &self.fields {
            let mut property = field.ty.to_json_schema(dialect);
            if let Value::Object(map) = &mut property {
                map.insert(
                    "description".to_string(),
                    Value::String(field.description.clone()),
                );
                if field.optional && dialect == SchemaDialect::Gemini {
                    map.insert("nullable".to_string(), Value::Bool(true));
                }
            }
            properties.insert(field.name.clone(), property);
            ordering.push(Value::String(field.name.clone()));
            if !field.optional {
                required.push(Value::String(field.name.clone()));
            }
        }

        let object_type = match dialect {
            SchemaDialect::JsonSchema => "object",
            SchemaDialect::Gemini => "OBJECT",
        };
        let mut schema = Map::new();
        schema.insert("type".to_string(), Value::String(object_type.to_string()));
        schema.insert("properties".to_string(), Value::Object(properties));
        schema.insert("required".to_string(), Value::Array(required));
        match dialect {
            SchemaDialect::JsonSchema => {
                schema.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            SchemaDialect::Gemini => {
                schema.insert("propertyOrdering".to_string(), Value::Array(ordering));
            }
        }
        Value::Object(schema)
    }
}

fn check_type(ty: &FieldType, owner: &str, path: &str) -> Result<(), SchemaError> {
    match ty {
        FieldType::Array(item) => check_type(item, owner, &format!("{path}[]")),
        FieldType::Object(schema) if schema.is_empty() => Err(SchemaError::InvalidSchema {
            owner: owner.to_string(),
            reason: format!("{path}: object has no fields"),
        }),
        FieldType::Object(schema) => schema.check_at(owner, path),
        FieldType::String | FieldType::Number | FieldType::Boolean => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tour_schema() -> Schema {
        Schema::new()
            .field(
                "tourSteps",
                FieldType::array_of(FieldType::String),
                "Steps of the tour.",
            )
            .optional_field("note", FieldType::String, "Optional note.")
    }

    #[test]
    fn test_check_accepts_valid_schema() {
        assert!(tour_schema().check("tour").is_ok());
    }

    #[test]
    fn test_check_rejects_duplicate_field() {
        let schema = Schema::new()
            .field("a", FieldType::String, "first")
            .field("a", FieldType::Number, "second");
        let err = schema.check("op").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema { .. }));
        assert!(err.to_string().contains("duplicate field 'a'"));
    }

    #[test]
    fn test_check_rejects_empty_name_and_empty_object() {
        let schema = Schema::new().field(" ", FieldType::String, "blank");
        assert!(schema.check("op").is_err());

        let schema = Schema::new().field("inner", FieldType::Object(Schema::new()), "empty");
        let err = schema.check("op").unwrap_err();
        assert!(err.to_string().contains("$.inner: object has no fields"));
    }

    #[test]
    fn test_check_descends_into_array_items() {
        let nested = Schema::new()
            .field("x", FieldType::String, "x")
            .field("x", FieldType::String, "x again");
        let schema = Schema::new().field(
            "rows",
            FieldType::array_of(FieldType::Object(nested)),
            "rows",
        );
        let err = schema.check("op").unwrap_err();
        assert!(err.to_string().contains("$.rows[]: duplicate field 'x'"));
    }

    #[test]
    fn test_json_schema_export() {
        let schema = tour_schema().to_json_schema(SchemaDialect::JsonSchema);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["properties"]["tourSteps"]["type"], "array");
        assert_eq!(schema["properties"]["tourSteps"]["items"]["type"], "string");
        assert_eq!(
            schema["properties"]["tourSteps"]["description"],
            "Steps of the tour."
        );
        assert_eq!(schema["required"], json!(["tourSteps"]));
    }

    #[test]
    fn test_gemini_schema_export() {
        let schema = tour_schema().to_json_schema(SchemaDialect::Gemini);
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["tourSteps"]["type"], "ARRAY");
        assert_eq!(schema["properties"]["tourSteps"]["items"]["type"], "STRING");
        assert_eq!(schema["properties"]["note"]["nullable"], true);
        assert_eq!(schema["propertyOrdering"], json!(["tourSteps", "note"]));
        assert!(schema.get("additionalProperties").is_none());
    }
}
