//! Registry of named operations.
//!
//! Every operation is checked once at registration: schemas must be
//! well-formed, tool names unique, and the prompt template must parse and
//! only reference declared input fields. After that an [`OperationSpec`] is
//! immutable and shared by `Arc`.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::genai::SafetySetting;
use crate::prompt::PromptTemplate;
use crate::tools::ToolSpec;

use super::{Schema, SchemaError};

/// Unchecked operation definition, as written by a flow module.
#[derive(Debug, Clone)]
pub struct OperationDef {
    name: String,
    input: Schema,
    output: Schema,
    template: String,
    tools: Vec<ToolSpec>,
    safety_settings: Vec<SafetySetting>,
}

impl OperationDef {
    #[must_use]
    pub fn new(name: &str, input: Schema, output: Schema, template: &str) -> Self {
        Self {
            name: name.to_string(),
            input,
            output,
            template: template.to_string(),
            tools: Vec::new(),
            safety_settings: Vec::new(),
        }
    }

    /// Declare a tool the model may call.
    #[must_use]
    pub fn with_tool(mut self, tool: ToolSpec) -> Self {
        self.tools.push(tool);
        self
    }

    /// Safety settings forwarded with every request.
    #[must_use]
    pub fn with_safety_settings(mut self, settings: Vec<SafetySetting>) -> Self {
        self.safety_settings = settings;
        self
    }
}

/// A registered, validated operation.
#[derive(Debug)]
pub struct OperationSpec {
    name: String,
    input: Schema,
    output: Schema,
    template: PromptTemplate,
    tools: Vec<ToolSpec>,
    safety_settings: Vec<SafetySetting>,
}

impl OperationSpec {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn input(&self) -> &Schema {
        &self.input
    }

    #[must_use]
    pub const fn output(&self) -> &Schema {
        &self.output
    }

    #[must_use]
    pub const fn template(&self) -> &PromptTemplate {
        &self.template
    }

    #[must_use]
    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    #[must_use]
    pub fn safety_settings(&self) -> &[SafetySetting] {
        &self.safety_settings
    }

    /// Look up a declared tool by name.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == name)
    }
}

/// Name-keyed collection of operations.
#[derive(Debug, Default)]
pub struct Registry {
    operations: BTreeMap<String, Arc<OperationSpec>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add an operation.
    ///
    /// # Errors
    ///
    /// - `DuplicateOperation` if the name is taken
    /// - `InvalidSchema` for malformed input, output or tool schemas, or
    ///   duplicate tool names
    /// - `InvalidTemplate` if the template is malformed or references a
    ///   field the input schema does not declare
    pub fn register(&mut self, def: OperationDef) -> Result<Arc<OperationSpec>, SchemaError> {
        if self.operations.contains_key(&def.name) {
            return Err(SchemaError::DuplicateOperation(def.name));
        }

        def.input.check(&def.name)?;
        def.output.check(&def.name)?;
        if def.output.is_empty() {
            return Err(SchemaError::InvalidSchema {
                owner: def.name,
                reason: "output schema has no fields".to_string(),
            });
        }

        let mut tool_names = HashSet::new();
        for tool in &def.tools {
            if !tool_names.insert(tool.name.as_str()) {
                return Err(SchemaError::InvalidSchema {
                    owner: def.name.clone(),
                    reason: format!("duplicate tool '{}'", tool.name),
                });
            }
            tool.input.check(&tool.name)?;
            tool.output.check(&tool.name)?;
        }

        let template = PromptTemplate::parse(&def.template)
            .and_then(|t| t.check_against(&def.input).map(|()| t))
            .map_err(|source| SchemaError::InvalidTemplate {
                operation: def.name.clone(),
                source,
            })?;

        let spec = Arc::new(OperationSpec {
            name: def.name.clone(),
            input: def.input,
            output: def.output,
            template,
            tools: def.tools,
            safety_settings: def.safety_settings,
        });
        debug!(operation = %spec.name, tools = spec.tools.len(), "operation registered");
        self.operations.insert(def.name, Arc::clone(&spec));
        Ok(spec)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<OperationSpec>> {
        self.operations.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use super::*;
    use crate::prompt::TemplateError;
    use crate::schema::FieldType;
    use crate::tools::{ToolError, ToolHandler};

    struct Noop;

    #[async_trait]
    impl ToolHandler for Noop {
        async fn call(&self, _input: Value) -> Result<Value, ToolError> {
            Ok(json!({"ok": true}))
        }
    }

    fn noop_tool(name: &str) -> ToolSpec {
        ToolSpec {
            name: name.to_string(),
            description: "Does nothing.".to_string(),
            input: Schema::new().field("q", FieldType::String, "Query."),
            output: Schema::new().field("ok", FieldType::Boolean, "Always true."),
            handler: Arc::new(Noop),
        }
    }

    fn def(name: &str, template: &str) -> OperationDef {
        OperationDef::new(
            name,
            Schema::new().field("productName", FieldType::String, "Product."),
            Schema::new().field("text", FieldType::String, "Answer."),
            template,
        )
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        let spec = registry
            .register(def("describe", "Describe {{{productName}}}."))
            .expect("register");

        assert_eq!(spec.name(), "describe");
        assert_eq!(registry.len(), 1);
        assert!(registry.get("describe").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["describe"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = Registry::new();
        registry
            .register(def("describe", "{{productName}}"))
            .expect("first");
        let err = registry
            .register(def("describe", "{{productName}}"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateOperation(ref n) if n == "describe"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_template_with_undeclared_field_fails() {
        let mut registry = Registry::new();
        let err = registry
            .register(def("describe", "{{productName}} in {{colour}}"))
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidTemplate {
                source: TemplateError::MissingField(ref f),
                ..
            } if f == "colour"
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_malformed_template_fails() {
        let mut registry = Registry::new();
        let err = registry
            .register(def("describe", "{{#each productName}}"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_invalid_schema_fails() {
        let mut registry = Registry::new();
        let bad = OperationDef::new(
            "bad",
            Schema::new()
                .field("a", FieldType::String, "a")
                .field("a", FieldType::String, "a"),
            Schema::new().field("b", FieldType::String, "b"),
            "{{a}}",
        );
        assert!(matches!(
            registry.register(bad),
            Err(SchemaError::InvalidSchema { .. })
        ));

        let no_output = OperationDef::new("empty", Schema::new(), Schema::new(), "static");
        assert!(matches!(
            registry.register(no_output),
            Err(SchemaError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_duplicate_tool_names_fail() {
        let mut registry = Registry::new();
        let err = registry
            .register(
                def("insights", "{{productName}}")
                    .with_tool(noop_tool("lookup"))
                    .with_tool(noop_tool("lookup")),
            )
            .unwrap_err();
        assert!(err.to_string().contains("duplicate tool 'lookup'"));
    }

    #[test]
    fn test_tools_and_safety_settings_are_kept() {
        use crate::genai::{HarmBlockThreshold, HarmCategory};

        let mut registry = Registry::new();
        let spec = registry
            .register(
                def("insights", "{{productName}}")
                    .with_tool(noop_tool("lookup"))
                    .with_safety_settings(vec![SafetySetting::new(
                        HarmCategory::Harassment,
                        HarmBlockThreshold::BlockMediumAndAbove,
                    )]),
            )
            .expect("register");
        assert!(spec.tool("lookup").is_some());
        assert!(spec.tool("other").is_none());
        assert_eq!(spec.safety_settings().len(), 1);
    }
}
