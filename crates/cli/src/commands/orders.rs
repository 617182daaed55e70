//! Order listing from the sample order book.

use kalakar_studio::services::{InMemoryOrderStore, OrderHistory};

use super::{CommandError, print_json};

/// Print every order, optionally only those for one product.
pub async fn list(product: Option<&str>) -> Result<(), CommandError> {
    let store = InMemoryOrderStore::with_sample_orders();
    let mut orders = store.orders().await?;
    if let Some(product) = product {
        orders.retain(|order| order.product == product);
    }
    print_json(&orders)
}
