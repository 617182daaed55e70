//! Gemini model access.
//!
//! - [`client`]: HTTP client for one `generateContent` round trip
//! - [`generator`]: prompt assembly, tool loop and output validation
//! - [`types`]: request/response wire types

pub mod client;
pub mod error;
pub mod generator;
pub mod types;

pub use client::{GeminiClient, ModelClient};
pub use error::GenerationError;
pub use generator::{GenerationRequest, GenerationResponse, Generator, MAX_TOOL_ROUNDS};
pub use types::{
    Candidate, Content, FinishReason, FunctionCall, FunctionDeclaration, FunctionResponse,
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, HarmBlockThreshold,
    HarmCategory, Part, PromptFeedback, Role, SafetySetting, ToolDeclaration, UsageMetadata,
};
