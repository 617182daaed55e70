//! Kalakar Studio library.
//!
//! AI-assisted content flows for the artisan dashboard, plus the HTTP
//! service that exposes them.
//!
//! # Layers
//!
//! - [`schema`] - declarative input/output schemas and the operation registry
//! - [`prompt`] - prompt template parsing and rendering
//! - [`genai`] - Gemini client and structured generation with tool calls
//! - [`tools`] - tools the model may call mid-generation
//! - [`flows`] - one typed async method per business capability
//! - [`services`] - order history backing the tools and routes
//! - [`routes`] - axum handlers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod flows;
pub mod genai;
pub mod prompt;
pub mod routes;
pub mod schema;
pub mod services;
pub mod state;
pub mod tools;

pub use flows::{FlowError, Flows};
