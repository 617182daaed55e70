//! Errors returned by flows.

use thiserror::Error;

use crate::genai::GenerationError;
use crate::prompt::TemplateError;
use crate::schema::SchemaViolation;
use crate::tools::ToolError;

/// Errors from a single flow call.
///
/// A failed call returns no partial output.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The caller's input does not match the operation's input schema.
    #[error("invalid input: {0}")]
    InvalidInput(SchemaViolation),

    /// The prompt could not be rendered.
    #[error("prompt rendering failed: {0}")]
    Template(#[from] TemplateError),

    /// The model call failed.
    #[error("generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),

    /// Model output or tool arguments did not match their schema.
    #[error("schema validation failed: {0}")]
    SchemaValidation(SchemaViolation),

    /// The model kept requesting tools.
    #[error("model exceeded {0} tool rounds")]
    TooManyToolRounds(usize),

    /// A tool handler failed.
    #[error("tool {tool} failed: {source}")]
    ToolFailed {
        tool: String,
        #[source]
        source: ToolError,
    },

    /// Typed input could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No operation with this name is registered.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

impl FlowError {
    /// Whether the caller, not the model, is at fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
