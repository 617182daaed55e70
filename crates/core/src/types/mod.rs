//! Core types for Kalakar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod order;
pub mod price;
pub mod status;

pub use id::*;
pub use order::Order;
pub use price::{CurrencyCode, Price};
pub use status::{OrderStatus, ParseStatusError};
