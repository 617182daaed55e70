//! Subcommand implementations.

pub mod flows;
pub mod orders;

use std::sync::Arc;

use kalakar_studio::config::{ConfigError, GeminiConfig};
use kalakar_studio::flows::{FlowError, Flows};
use kalakar_studio::genai::{GeminiClient, GenerationError};
use kalakar_studio::schema::SchemaError;
use kalakar_studio::services::{InMemoryOrderStore, OrderStoreError};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by any subcommand.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model client error: {0}")]
    Client(#[from] GenerationError),

    #[error("Flow registration failed: {0}")]
    Registration(#[from] SchemaError),

    #[error("Flow failed: {0}")]
    Flow(#[from] FlowError),

    #[error("Order store error: {0}")]
    Orders(#[from] OrderStoreError),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flows bound to the configured Gemini model and the sample order book.
///
/// # Errors
///
/// Returns `CommandError` if `GEMINI_API_KEY` is missing or flow
/// registration fails.
pub fn connect() -> Result<Flows, CommandError> {
    let config = GeminiConfig::from_env()?;
    let client = GeminiClient::new(&config)?;
    tracing::debug!(model = %config.model, "Gemini client ready");
    Ok(Flows::new(
        Arc::new(client),
        Arc::new(InMemoryOrderStore::with_sample_orders()),
    )?)
}

/// Print a value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns `CommandError::Json` if serialization fails.
#[allow(clippy::print_stdout)]
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
