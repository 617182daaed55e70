//! Kalakar Core - Shared domain types.
//!
//! This crate provides the types used across all Kalakar components:
//! - `studio` - AI flow library and HTTP service
//! - `cli` - Command-line front end for the flows
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no model
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, INR prices, order statuses and orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
