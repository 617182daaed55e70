//! Data services backing tools and routes.

pub mod orders;

pub use orders::{InMemoryOrderStore, OrderHistory, OrderStoreError};
