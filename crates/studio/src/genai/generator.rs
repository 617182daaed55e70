//! Structured generation on top of a [`ModelClient`].
//!
//! A generation renders the operation's prompt, asks the model for JSON
//! matching the output schema, runs any tool calls the model makes, and
//! validates the final answer. There is no retry: a response that does not
//! parse or validate fails the call.

use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::flows::FlowError;
use crate::prompt::output_instructions;
use crate::schema::{OperationSpec, Schema, SchemaDialect, SchemaViolation};
use crate::tools::{ToolCallOutcome, ToolInvocation, ToolSpec, declarations, resolve_tool_calls};

use super::client::ModelClient;
use super::error::GenerationError;
use super::types::{
    Content, FinishReason, FunctionCall, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, SafetySetting,
};

/// Maximum model round trips that may end in tool calls.
pub const MAX_TOOL_ROUNDS: usize = 5;

/// A validated request to run one operation.
#[derive(Debug)]
pub struct GenerationRequest<'a> {
    operation: &'a OperationSpec,
    input: Value,
}

impl<'a> GenerationRequest<'a> {
    /// Bind `input` to `operation`.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::InvalidInput` if `input` does not match the
    /// operation's input schema.
    pub fn new(operation: &'a OperationSpec, input: Value) -> Result<Self, FlowError> {
        operation
            .input()
            .validate(&input)
            .map_err(FlowError::InvalidInput)?;
        Ok(Self { operation, input })
    }

    #[must_use]
    pub const fn operation(&self) -> &OperationSpec {
        self.operation
    }

    #[must_use]
    pub const fn input(&self) -> &Value {
        &self.input
    }
}

/// Validated output plus the tools that ran to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub output: Value,
    pub tool_invocations: Vec<ToolInvocation>,
}

/// Runs operations against a model.
#[derive(Clone)]
pub struct Generator {
    client: Arc<dyn ModelClient>,
}

impl Generator {
    #[must_use]
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Render the operation's prompt and invoke the model.
    ///
    /// # Errors
    ///
    /// See [`Generator::invoke`]; template failures are `FlowError::Template`.
    pub async fn generate(
        &self,
        request: GenerationRequest<'_>,
    ) -> Result<GenerationResponse, FlowError> {
        let operation = request.operation;
        let span = info_span!(
            "generate",
            operation = %operation.name(),
            model = %self.client.model(),
            request_id = %Uuid::new_v4(),
        );

        async move {
            let rendered = operation.template().render(&request.input)?;
            let prompt = format!("{rendered}\n\n{}", output_instructions(operation.output()));
            self.invoke(
                prompt,
                operation.output(),
                operation.tools(),
                operation.safety_settings(),
            )
            .await
        }
        .instrument(span)
        .await
    }

    /// Send `prompt` and return output conforming to `output`.
    ///
    /// Without tools the request uses JSON mode with a response schema.
    /// With tools, function declarations are sent instead and each turn of
    /// function calls is resolved and answered, up to [`MAX_TOOL_ROUNDS`].
    ///
    /// # Errors
    ///
    /// - `GenerationFailed` for transport, API, safety or empty responses
    /// - `SchemaValidation` when the answer is not JSON or does not match
    /// - `TooManyToolRounds` when the model keeps calling tools
    /// - `ToolFailed` when a tool handler fails
    #[instrument(skip_all, fields(tools = tools.len()))]
    pub async fn invoke(
        &self,
        prompt: String,
        output: &Schema,
        tools: &[ToolSpec],
        safety_settings: &[SafetySetting],
    ) -> Result<GenerationResponse, FlowError> {
        let generation_config = tools
            .is_empty()
            .then(|| GenerationConfig::json(output.to_json_schema(SchemaDialect::Gemini)));
        let mut request = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            tools: declarations(tools),
            safety_settings: safety_settings.to_vec(),
            generation_config,
        };
        let mut tool_invocations = Vec::new();
        let mut tool_rounds = 0;

        loop {
            let response = self.client.generate_content(&request).await?;
            let content = answer_content(&response)?;

            let calls: Vec<FunctionCall> = content.function_calls().cloned().collect();
            if calls.is_empty() {
                let output = parse_output(&content.text(), output)?;
                return Ok(GenerationResponse {
                    output,
                    tool_invocations,
                });
            }

            tool_rounds += 1;
            if tool_rounds > MAX_TOOL_ROUNDS {
                warn!(rounds = tool_rounds, "too many tool rounds, stopping");
                return Err(FlowError::TooManyToolRounds(MAX_TOOL_ROUNDS));
            }

            let outcomes = resolve_tool_calls(&calls, tools).await?;
            let responses = outcomes.iter().map(ToolCallOutcome::response_part).collect();
            request.contents.push(content);
            request.contents.push(Content::function_responses(responses));
            tool_invocations.extend(outcomes.into_iter().filter_map(ToolCallOutcome::into_invocation));
        }
    }
}

/// Pick the answer out of a response, logging usage.
fn answer_content(response: &GenerateContentResponse) -> Result<Content, GenerationError> {
    let usage = response.usage_metadata.unwrap_or_default();

    if let Some(reason) = response.block_reason() {
        warn!(block_reason = %reason, "prompt blocked");
        return Err(GenerationError::Blocked(reason.to_string()));
    }

    let candidate = response
        .first_candidate()
        .ok_or(GenerationError::EmptyResponse)?;

    info!(
        finish_reason = ?candidate.finish_reason,
        prompt_tokens = usage.prompt_token_count,
        candidates_tokens = usage.candidates_token_count,
        total_tokens = usage.total_token_count,
        "model response received"
    );

    if candidate.finish_reason == Some(FinishReason::Safety) {
        return Err(GenerationError::Blocked("SAFETY".to_string()));
    }

    candidate
        .content
        .clone()
        .filter(|c| !c.parts.is_empty())
        .ok_or(GenerationError::EmptyResponse)
}

/// Parse and validate the final answer text.
fn parse_output(text: &str, schema: &Schema) -> Result<Value, FlowError> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(GenerationError::EmptyResponse.into());
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FlowError::SchemaValidation(SchemaViolation::Unparseable(e.to_string())))?;
    schema.validate(&value).map_err(FlowError::SchemaValidation)?;
    Ok(value)
}

/// Remove a surrounding Markdown code fence, with or without a language tag.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);

    // A language tag is a leading word followed by whitespace.
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let (tag, body) = rest.split_at(tag_len);
    if !tag.is_empty() && body.starts_with(char::is_whitespace) {
        body.trim()
    } else {
        rest.trim()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::genai::{Part, PromptFeedback};
    use crate::schema::FieldType;

    /// Replays canned responses in order and records requests.
    struct Replay {
        responses: Mutex<Vec<GenerateContentResponse>>,
        requests: Mutex<Vec<GenerateContentRequest>>,
        calls: AtomicUsize,
    }

    impl Replay {
        fn new(mut responses: Vec<GenerateContentResponse>) -> Arc<Self> {
            responses.reverse();
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ModelClient for Replay {
        fn model(&self) -> &str {
            "replay"
        }

        async fn generate_content(
            &self,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().expect("lock").push(request.clone());
            self.responses
                .lock()
                .expect("lock")
                .pop()
                .ok_or(GenerationError::EmptyResponse)
        }
    }

    fn ideas_schema() -> Schema {
        Schema::new().field(
            "marketingIdeas",
            FieldType::array_of(FieldType::String),
            "Ideas.",
        )
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  ```\n{\"a\":1}```  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```"), "");
        assert_eq!(
            strip_code_fences("```{\"translation\":\"x\"}```"),
            "{\"translation\":\"x\"}"
        );
        assert_eq!(strip_code_fences("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\ntrue\n```"), "true");
    }

    #[tokio::test]
    async fn test_single_line_fence_is_parsed() {
        let model = Replay::new(vec![GenerateContentResponse::from_text(
            "```{\"marketingIdeas\":[\"Live demo\"]}```",
        )]);
        let response = Generator::new(model)
            .invoke("prompt".to_string(), &ideas_schema(), &[], &[])
            .await
            .expect("invoke");
        assert_eq!(response.output, json!({"marketingIdeas": ["Live demo"]}));
    }

    #[tokio::test]
    async fn test_invoke_json_mode_without_tools() {
        let model = Replay::new(vec![GenerateContentResponse::from_text(
            "```json\n{\"marketingIdeas\": [\"Diwali bundle\", \"Reels\"]}\n```",
        )]);
        let generator = Generator::new(model.clone());

        let response = generator
            .invoke("prompt".to_string(), &ideas_schema(), &[], &[])
            .await
            .expect("invoke");

        assert_eq!(
            response.output,
            json!({"marketingIdeas": ["Diwali bundle", "Reels"]})
        );
        assert!(response.tool_invocations.is_empty());

        let requests = model.requests.lock().expect("lock");
        let config = requests[0].generation_config.as_ref().expect("config");
        assert_eq!(config.response_mime_type.as_deref(), Some("application/json"));
        assert_eq!(
            config.response_schema.as_ref().expect("schema")["type"],
            "OBJECT"
        );
        assert!(requests[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json_is_schema_validation_error() {
        let model = Replay::new(vec![GenerateContentResponse::from_text("Sure! Here are ideas")]);
        let err = Generator::new(model)
            .invoke("prompt".to_string(), &ideas_schema(), &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::SchemaValidation(SchemaViolation::Unparseable(_))
        ));
    }

    #[tokio::test]
    async fn test_non_conforming_json_is_schema_validation_error() {
        let model = Replay::new(vec![GenerateContentResponse::from_text(
            "{\"marketingIdeas\": \"just one\"}",
        )]);
        let err = Generator::new(model)
            .invoke("prompt".to_string(), &ideas_schema(), &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::SchemaValidation(SchemaViolation::TypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_generation_failure() {
        let blocked = GenerateContentResponse {
            candidates: Vec::new(),
            prompt_feedback: Some(PromptFeedback {
                block_reason: Some("SAFETY".to_string()),
            }),
            usage_metadata: None,
        };
        let err = Generator::new(Replay::new(vec![blocked]))
            .invoke("prompt".to_string(), &ideas_schema(), &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::GenerationFailed(GenerationError::Blocked(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_generation_failure() {
        let err = Generator::new(Replay::new(vec![GenerateContentResponse::default()]))
            .invoke("prompt".to_string(), &ideas_schema(), &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::GenerationFailed(GenerationError::EmptyResponse)
        ));
    }

    #[tokio::test]
    async fn test_model_turn_is_resent_with_thought_signature() {
        let signed_call = Part {
            thought_signature: Some("c2lnbmF0dXJl".to_string()),
            ..Part::function_call("mystery", json!({}))
        };
        let model = Replay::new(vec![
            GenerateContentResponse::from_parts(vec![signed_call]),
            GenerateContentResponse::from_text("{\"marketingIdeas\": []}"),
        ]);
        Generator::new(model.clone())
            .invoke("prompt".to_string(), &ideas_schema(), &[], &[])
            .await
            .expect("invoke");

        let requests = model.requests.lock().expect("lock");
        let resent = serde_json::to_value(&requests[1].contents[1]).expect("serialize");
        assert_eq!(resent["role"], "model");
        assert_eq!(resent["parts"][0]["thoughtSignature"], "c2lnbmF0dXJl");
        assert_eq!(resent["parts"][0]["functionCall"]["name"], "mystery");
    }

    #[tokio::test]
    async fn test_unknown_tool_calls_are_answered_and_loop_is_bounded() {
        let looping: Vec<_> = (0..=MAX_TOOL_ROUNDS)
            .map(|_| {
                GenerateContentResponse::from_parts(vec![Part::function_call(
                    "mystery",
                    json!({}),
                )])
            })
            .collect();
        let model = Replay::new(looping);
        let err = Generator::new(model.clone())
            .invoke("prompt".to_string(), &ideas_schema(), &[], &[])
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::TooManyToolRounds(MAX_TOOL_ROUNDS)));
        assert_eq!(model.calls.load(Ordering::SeqCst), MAX_TOOL_ROUNDS + 1);

        let requests = model.requests.lock().expect("lock");
        let last = requests.last().expect("request");
        let answer = last.contents.last().expect("content");
        let response = answer.parts[0].function_response.as_ref().expect("response");
        assert_eq!(response.response, json!({"error": "unknown tool"}));
    }
}
