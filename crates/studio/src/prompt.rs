//! Prompt template engine.
//!
//! Templates are parsed once when an operation is registered and rendered
//! per call against the validated input value. Supported tags:
//!
//! - `{{field}}` and `{{{field}}}`: substitute a field (no escaping either way)
//! - `{{a.b}}`: dotted path into nested objects
//! - `{{#each items}}...{{/each}}`: repeat the block once per array element;
//!   inside the block `{{this}}`, `{{this.field}}` and `{{@index}}` refer to
//!   the current element, any other path resolves from the root input
//!
//! Rendering is pure: the same template and input always produce the same
//! string.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde_json::Value;
use thiserror::Error;

use crate::schema::{FieldType, Schema, SchemaDialect};

/// Errors from parsing or rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template references a field absent from the input.
    #[error("template references missing field: {0}")]
    MissingField(String),

    /// An `#each` block targets a value that is not an array.
    #[error("cannot iterate over non-array field: {0}")]
    NotIterable(String),

    /// The template text itself is invalid.
    #[error("malformed template at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Path {
    /// `{{this}}` or `{{this.a.b}}`
    This(Vec<String>),
    /// `{{@index}}`
    Index,
    /// `{{a.b}}`
    Root(Vec<String>),
}

impl Path {
    fn parse(raw: &str, offset: usize) -> Result<Self, TemplateError> {
        let malformed = |reason: &str| TemplateError::Malformed {
            offset,
            reason: reason.to_string(),
        };

        if raw == "@index" {
            return Ok(Self::Index);
        }
        if raw.is_empty() {
            return Err(malformed("empty tag"));
        }

        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        let valid = segments.iter().all(|s| {
            !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !valid {
            return Err(malformed(&format!("invalid field path '{raw}'")));
        }

        match segments.split_first() {
            Some((first, rest)) if first == "this" => Ok(Self::This(rest.to_vec())),
            _ => Ok(Self::Root(segments)),
        }
    }

    fn display(&self) -> String {
        match self {
            Self::This(rest) if rest.is_empty() => "this".to_string(),
            Self::This(rest) => format!("this.{}", rest.join(".")),
            Self::Index => "@index".to_string(),
            Self::Root(segments) => segments.join("."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Var(Path),
    Each { path: Path, body: Vec<Self> },
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    nodes: Vec<Node>,
}

/// Element scope inside an `#each` block.
#[derive(Clone, Copy)]
struct Scope<'a> {
    item: &'a Value,
    index: usize,
}

impl PromptTemplate {
    /// Parse template text.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Malformed` for unclosed tags, stray or
    /// unclosed `#each` blocks and invalid field paths.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut stack: Vec<(Path, Vec<Node>, usize)> = Vec::new();
        let mut current: Vec<Node> = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                current.push(Node::Text(rest[..start].to_string()));
            }
            let tag_offset = offset + start;
            let after_open = &rest[start..];
            let (open_len, close) = if after_open.starts_with("{{{") {
                (3, "}}}")
            } else {
                (2, "}}")
            };
            let inner_start = start + open_len;
            let Some(inner_len) = rest[inner_start..].find(close) else {
                return Err(TemplateError::Malformed {
                    offset: tag_offset,
                    reason: "unclosed tag".to_string(),
                });
            };
            let tag = rest[inner_start..inner_start + inner_len].trim();

            if let Some(target) = tag.strip_prefix("#each") {
                let path = Path::parse(target.trim(), tag_offset)?;
                stack.push((path, std::mem::take(&mut current), tag_offset));
            } else if tag == "/each" {
                let Some((path, parent, _)) = stack.pop() else {
                    return Err(TemplateError::Malformed {
                        offset: tag_offset,
                        reason: "'/each' without matching '#each'".to_string(),
                    });
                };
                let body = std::mem::replace(&mut current, parent);
                current.push(Node::Each { path, body });
            } else {
                current.push(Node::Var(Path::parse(tag, tag_offset)?));
            }

            let consumed = inner_start + inner_len + close.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        if let Some((_, _, open_offset)) = stack.last() {
            return Err(TemplateError::Malformed {
                offset: *open_offset,
                reason: "unclosed '#each' block".to_string(),
            });
        }
        if !rest.is_empty() {
            current.push(Node::Text(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            nodes: current,
        })
    }

    /// Top-level input fields the template reads.
    #[must_use]
    pub fn referenced_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        collect_roots(&self.nodes, &mut fields);
        fields
    }

    /// Check that every referenced field exists in `schema` and that
    /// `#each` targets are arrays.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` or `NotIterable` for the first offending field.
    pub fn check_against(&self, schema: &Schema) -> Result<(), TemplateError> {
        for name in self.referenced_fields() {
            if schema.get(&name).is_none() {
                return Err(TemplateError::MissingField(name));
            }
        }
        check_each_targets(&self.nodes, schema)
    }

    /// Render against an input value.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` when a referenced field is absent from `input`,
    /// or `NotIterable` when an `#each` target is not an array.
    pub fn render(&self, input: &Value) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(self.source.len());
        render_nodes(&self.nodes, input, None, &mut out)?;
        Ok(out)
    }
}

fn collect_roots(nodes: &[Node], fields: &mut BTreeSet<String>) {
    for node in nodes {
        match node {
            Node::Var(Path::Root(segments)) => {
                if let Some(first) = segments.first() {
                    fields.insert(first.clone());
                }
            }
            Node::Each { path, body } => {
                if let Path::Root(segments) = path
                    && let Some(first) = segments.first()
                {
                    fields.insert(first.clone());
                }
                collect_roots(body, fields);
            }
            Node::Text(_) | Node::Var(_) => {}
        }
    }
}

fn check_each_targets(nodes: &[Node], schema: &Schema) -> Result<(), TemplateError> {
    for node in nodes {
        if let Node::Each { path, body } = node {
            if let Path::Root(segments) = path
                && let [name] = segments.as_slice()
                && let Some(field) = schema.get(name)
                && !matches!(field.ty, FieldType::Array(_))
            {
                return Err(TemplateError::NotIterable(name.clone()));
            }
            check_each_targets(body, schema)?;
        }
    }
    Ok(())
}

fn render_nodes(
    nodes: &[Node],
    root: &Value,
    scope: Option<Scope<'_>>,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(Path::Index) => {
                let scope = scope.ok_or_else(|| TemplateError::MissingField("@index".into()))?;
                let _ = write!(out, "{}", scope.index);
            }
            Node::Var(path) => write_value(out, resolve(path, root, scope)?),
            Node::Each { path, body } => {
                let target = resolve(path, root, scope)?;
                let Value::Array(items) = target else {
                    return Err(TemplateError::NotIterable(path.display()));
                };
                for (index, item) in items.iter().enumerate() {
                    render_nodes(body, root, Some(Scope { item, index }), out)?;
                }
            }
        }
    }
    Ok(())
}

fn resolve<'a>(
    path: &Path,
    root: &'a Value,
    scope: Option<Scope<'a>>,
) -> Result<&'a Value, TemplateError> {
    let missing = || TemplateError::MissingField(path.display());
    let (base, segments) = match path {
        Path::This(rest) => (scope.ok_or_else(missing)?.item, rest.as_slice()),
        Path::Root(segments) => (root, segments.as_slice()),
        Path::Index => return Err(missing()),
    };
    segments
        .iter()
        .try_fold(base, |value, segment| value.get(segment))
        .ok_or_else(missing)
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
        }
        Value::Object(_) => out.push_str(&value.to_string()),
    }
}

/// Output-format guidance appended to every prompt.
///
/// Carries the JSON Schema of the expected output plus a field guide with
/// each field's description, in declaration order.
#[must_use]
pub fn output_instructions(schema: &Schema) -> String {
    let json_schema = serde_json::to_string_pretty(&schema.to_json_schema(SchemaDialect::JsonSchema))
        .unwrap_or_default();
    let mut out = String::from(
        "Output should be in JSON format and conform to the following schema:\n\n```json\n",
    );
    out.push_str(&json_schema);
    out.push_str("\n```\n\nField guide:\n");
    write_field_guide(&mut out, schema, 0);
    out
}

fn write_field_guide(out: &mut String, schema: &Schema, depth: usize) {
    let indent = "  ".repeat(depth);
    for field in schema.fields() {
        let optional = if field.optional { ", optional" } else { "" };
        let _ = writeln!(
            out,
            "{indent}- {} ({}{optional}): {}",
            field.name,
            type_label(&field.ty),
            field.description
        );
        match &field.ty {
            FieldType::Object(nested) => write_field_guide(out, nested, depth + 1),
            FieldType::Array(item) => {
                if let FieldType::Object(nested) = item.as_ref() {
                    write_field_guide(out, nested, depth + 1);
                }
            }
            _ => {}
        }
    }
}

fn type_label(ty: &FieldType) -> String {
    match ty {
        FieldType::Array(item) => format!("array of {}", type_label(item)),
        other => other.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_render_double_and_triple_braces() {
        let template =
            PromptTemplate::parse("Product: {{{productName}}} / {{ category }}").expect("parse");
        let out = template
            .render(&json!({"productName": "Ganjifa Cards", "category": "Games"}))
            .expect("render");
        assert_eq!(out, "Product: Ganjifa Cards / Games");
    }

    #[test]
    fn test_render_numbers_and_booleans() {
        let template =
            PromptTemplate::parse("Price: {{price}}, volume: {{volume}}, gift: {{gift}}")
                .expect("parse");
        let out = template
            .render(&json!({"price": 2.5, "volume": 50, "gift": true}))
            .expect("render");
        assert_eq!(out, "Price: 2.5, volume: 50, gift: true");
    }

    #[test]
    fn test_render_each_one_line_per_element() {
        let template =
            PromptTemplate::parse("Texts:\n{{#each texts}}{{@index}}. {{this}}\n{{/each}}Done")
                .expect("parse");
        let out = template
            .render(&json!({"texts": ["Orders", "Dashboard"]}))
            .expect("render");
        assert_eq!(out, "Texts:\n0. Orders\n1. Dashboard\nDone");
    }

    #[test]
    fn test_render_each_over_empty_array() {
        let template = PromptTemplate::parse("[{{#each texts}}{{this}}{{/each}}]").expect("parse");
        let out = template.render(&json!({"texts": []})).expect("render");
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_render_each_with_object_elements_and_root_lookup() {
        let template = PromptTemplate::parse(
            "{{#each items}}{{this.name}} for {{event}}\n{{/each}}",
        )
        .expect("parse");
        let out = template
            .render(&json!({"event": "Diwali", "items": [{"name": "Diya"}, {"name": "Rangoli"}]}))
            .expect("render");
        assert_eq!(out, "Diya for Diwali\nRangoli for Diwali\n");
    }

    #[test]
    fn test_render_dotted_path() {
        let template = PromptTemplate::parse("{{artisan.region}}").expect("parse");
        let out = template
            .render(&json!({"artisan": {"region": "Kutch"}}))
            .expect("render");
        assert_eq!(out, "Kutch");
    }

    #[test]
    fn test_render_missing_field() {
        let template = PromptTemplate::parse("Hello {{name}}").expect("parse");
        let err = template.render(&json!({})).unwrap_err();
        assert_eq!(err, TemplateError::MissingField("name".to_string()));
    }

    #[test]
    fn test_render_each_over_non_array() {
        let template = PromptTemplate::parse("{{#each name}}{{this}}{{/each}}").expect("parse");
        let err = template.render(&json!({"name": "x"})).unwrap_err();
        assert_eq!(err, TemplateError::NotIterable("name".to_string()));
    }

    #[test]
    fn test_this_outside_each_is_missing() {
        let template = PromptTemplate::parse("{{this}}").expect("parse");
        assert!(matches!(
            template.render(&json!({})),
            Err(TemplateError::MissingField(_))
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            PromptTemplate::parse("Hello {{name"),
            Err(TemplateError::Malformed { offset: 6, .. })
        ));
        assert!(matches!(
            PromptTemplate::parse("{{#each xs}}{{this}}"),
            Err(TemplateError::Malformed { .. })
        ));
        assert!(matches!(
            PromptTemplate::parse("{{/each}}"),
            Err(TemplateError::Malformed { .. })
        ));
        assert!(matches!(
            PromptTemplate::parse("{{bad field}}"),
            Err(TemplateError::Malformed { .. })
        ));
    }

    #[test]
    fn test_referenced_fields() {
        let template = PromptTemplate::parse(
            "{{a}} {{b.c}} {{#each items}}{{this}} {{d}}{{/each}}",
        )
        .expect("parse");
        let fields: Vec<String> = template.referenced_fields().into_iter().collect();
        assert_eq!(fields, vec!["a", "b", "d", "items"]);
    }

    #[test]
    fn test_check_against_schema() {
        let schema = Schema::new()
            .field("name", FieldType::String, "Name.")
            .field("tags", FieldType::array_of(FieldType::String), "Tags.");

        let ok = PromptTemplate::parse("{{name}} {{#each tags}}{{this}}{{/each}}").expect("parse");
        assert!(ok.check_against(&schema).is_ok());

        let unknown = PromptTemplate::parse("{{nickname}}").expect("parse");
        assert_eq!(
            unknown.check_against(&schema),
            Err(TemplateError::MissingField("nickname".to_string()))
        );

        let not_array = PromptTemplate::parse("{{#each name}}{{this}}{{/each}}").expect("parse");
        assert_eq!(
            not_array.check_against(&schema),
            Err(TemplateError::NotIterable("name".to_string()))
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = PromptTemplate::parse("{{a}}-{{#each b}}{{this}},{{/each}}").expect("parse");
        let input = json!({"a": "x", "b": [1, 2, 3]});
        let first = template.render(&input).expect("render");
        let second = template.render(&input).expect("render");
        assert_eq!(first, second);
    }

    #[test]
    fn test_output_instructions_include_descriptions() {
        let schema = Schema::new()
            .field("suggestedPrice", FieldType::Number, "Price in INR.")
            .field("justification", FieldType::String, "Why.");
        let text = output_instructions(&schema);
        assert!(text.starts_with("Output should be in JSON format"));
        assert!(text.contains("- suggestedPrice (number): Price in INR."));
        assert!(text.contains("- justification (string): Why."));
        assert!(text.contains("\"additionalProperties\": false"));
    }
}
