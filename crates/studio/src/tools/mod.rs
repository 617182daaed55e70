//! Tools the model may call mid-generation.
//!
//! A tool is declared on an operation with input and output schemas and a
//! read-only handler. When a model turn contains function calls,
//! [`resolve_tool_calls`] runs each one in order and produces the function
//! responses fed back into the next round.

mod sales_data;

pub use sales_data::{SALES_DATA_TOOL, SalesDataTool};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::flows::FlowError;
use crate::genai::{FunctionCall, FunctionDeclaration, Part, ToolDeclaration};
use crate::schema::{Schema, SchemaDialect};

/// Errors raised by a tool handler.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments passed schema validation but the handler cannot use them.
    #[error("invalid tool input: {0}")]
    InvalidInput(String),

    /// The backing data source failed.
    #[error("tool execution failed: {0}")]
    Execution(String),
}

/// Executes one tool.
///
/// Handlers must be read-only and idempotent.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool on validated arguments. The result is validated against
    /// the tool's output schema by the caller.
    async fn call(&self, input: Value) -> Result<Value, ToolError>;
}

/// A tool declared on an operation.
#[derive(Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input: Schema,
    pub output: Schema,
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input", &self.input)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl ToolSpec {
    /// Declaration sent to the model.
    #[must_use]
    pub fn declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.input.to_json_schema(SchemaDialect::Gemini),
        }
    }
}

/// Record of a tool call that ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub input: Value,
    pub output: Value,
}

/// Result of handling one function call from the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCallOutcome {
    /// A declared tool ran successfully.
    Executed(ToolInvocation),
    /// The model asked for a tool the operation does not declare.
    Skipped { name: String },
}

impl ToolCallOutcome {
    /// Function response part answering this call.
    #[must_use]
    pub fn response_part(&self) -> Part {
        match self {
            Self::Executed(invocation) => {
                Part::function_response(&invocation.tool, invocation.output.clone())
            }
            Self::Skipped { name } => Part::function_response(name, json!({"error": "unknown tool"})),
        }
    }

    /// The recorded invocation, if the tool ran.
    #[must_use]
    pub fn into_invocation(self) -> Option<ToolInvocation> {
        match self {
            Self::Executed(invocation) => Some(invocation),
            Self::Skipped { .. } => None,
        }
    }
}

/// Tool block for a request; empty when the operation declares no tools.
#[must_use]
pub fn declarations(tools: &[ToolSpec]) -> Vec<ToolDeclaration> {
    if tools.is_empty() {
        return Vec::new();
    }
    vec![ToolDeclaration {
        function_declarations: tools.iter().map(ToolSpec::declaration).collect(),
    }]
}

/// Execute the function calls of one model turn, in order.
///
/// Unknown tool names are skipped. For known tools the arguments and the
/// result are validated against the tool's schemas.
///
/// # Errors
///
/// Returns `FlowError::SchemaValidation` when arguments or results violate
/// the tool's schemas, and `FlowError::ToolFailed` when a handler fails.
#[instrument(skip_all, fields(calls = calls.len()))]
pub async fn resolve_tool_calls(
    calls: &[FunctionCall],
    tools: &[ToolSpec],
) -> Result<Vec<ToolCallOutcome>, FlowError> {
    let mut outcomes = Vec::with_capacity(calls.len());

    for call in calls {
        let Some(tool) = tools.iter().find(|t| t.name == call.name) else {
            warn!(tool = %call.name, "model requested an undeclared tool, skipping");
            outcomes.push(ToolCallOutcome::Skipped {
                name: call.name.clone(),
            });
            continue;
        };

        let input = if call.args.is_null() {
            json!({})
        } else {
            call.args.clone()
        };
        tool.input.validate(&input).map_err(FlowError::SchemaValidation)?;

        let output = tool
            .handler
            .call(input.clone())
            .await
            .map_err(|source| FlowError::ToolFailed {
                tool: tool.name.clone(),
                source,
            })?;
        tool.output
            .validate(&output)
            .map_err(FlowError::SchemaValidation)?;

        debug!(tool = %tool.name, %input, %output, "tool executed");
        outcomes.push(ToolCallOutcome::Executed(ToolInvocation {
            tool: tool.name.clone(),
            input,
            output,
        }));
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::schema::{FieldType, SchemaViolation};

    struct Echo {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, input: Value) -> Result<Value, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let word = input["word"].as_str().unwrap_or_default();
            Ok(json!({"length": word.len()}))
        }
    }

    struct Broken;

    #[async_trait]
    impl ToolHandler for Broken {
        async fn call(&self, _input: Value) -> Result<Value, ToolError> {
            Ok(json!({"length": "seven"}))
        }
    }

    struct Failing;

    #[async_trait]
    impl ToolHandler for Failing {
        async fn call(&self, _input: Value) -> Result<Value, ToolError> {
            Err(ToolError::Execution("store offline".to_string()))
        }
    }

    fn tool(name: &str, handler: Arc<dyn ToolHandler>) -> ToolSpec {
        ToolSpec {
            name: name.to_string(),
            description: "Length of a word.".to_string(),
            input: Schema::new().field("word", FieldType::String, "Word."),
            output: Schema::new().field("length", FieldType::Number, "Length."),
            handler,
        }
    }

    fn call(name: &str, args: Value) -> FunctionCall {
        FunctionCall {
            name: name.to_string(),
            args,
        }
    }

    #[tokio::test]
    async fn test_known_tool_is_executed_and_recorded() {
        let echo = Arc::new(Echo {
            calls: AtomicUsize::new(0),
        });
        let tools = vec![tool("wordLength", echo.clone())];

        let outcomes = resolve_tool_calls(&[call("wordLength", json!({"word": "diya"}))], &tools)
            .await
            .expect("resolve");

        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            outcomes,
            vec![ToolCallOutcome::Executed(ToolInvocation {
                tool: "wordLength".to_string(),
                input: json!({"word": "diya"}),
                output: json!({"length": 4}),
            })]
        );
        assert_eq!(
            outcomes[0].response_part(),
            Part::function_response("wordLength", json!({"length": 4}))
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_is_skipped() {
        let echo = Arc::new(Echo {
            calls: AtomicUsize::new(0),
        });
        let tools = vec![tool("wordLength", echo.clone())];

        let outcomes = resolve_tool_calls(
            &[
                call("deleteEverything", json!({})),
                call("wordLength", json!({"word": "rangoli"})),
            ],
            &tools,
        )
        .await
        .expect("resolve");

        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            outcomes[0],
            ToolCallOutcome::Skipped {
                name: "deleteEverything".to_string()
            }
        );
        assert_eq!(
            outcomes[0].response_part(),
            Part::function_response("deleteEverything", json!({"error": "unknown tool"}))
        );
        let recorded: Vec<_> = outcomes
            .into_iter()
            .filter_map(ToolCallOutcome::into_invocation)
            .collect();
        assert_eq!(recorded.len(), 1);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_arguments_fail_without_calling_handler() {
        let echo = Arc::new(Echo {
            calls: AtomicUsize::new(0),
        });
        let tools = vec![tool("wordLength", echo.clone())];

        let err = resolve_tool_calls(&[call("wordLength", json!({"word": 7}))], &tools)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FlowError::SchemaValidation(SchemaViolation::TypeMismatch { .. })
        ));
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_tool_output_fails() {
        let tools = vec![tool("wordLength", Arc::new(Broken))];
        let err = resolve_tool_calls(&[call("wordLength", json!({"word": "x"}))], &tools)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::SchemaValidation(_)));
    }

    #[tokio::test]
    async fn test_handler_error_is_tool_failed() {
        let tools = vec![tool("wordLength", Arc::new(Failing))];
        let err = resolve_tool_calls(&[call("wordLength", json!({"word": "x"}))], &tools)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::ToolFailed { ref tool, .. } if tool == "wordLength"));
    }

    #[test]
    fn test_declarations() {
        assert!(declarations(&[]).is_empty());

        let tools = vec![tool("wordLength", Arc::new(Failing))];
        let declared = declarations(&tools);
        assert_eq!(declared.len(), 1);
        let function = &declared[0].function_declarations[0];
        assert_eq!(function.name, "wordLength");
        assert_eq!(function.parameters["type"], "OBJECT");
        assert_eq!(function.parameters["properties"]["word"]["type"], "STRING");
    }
}
