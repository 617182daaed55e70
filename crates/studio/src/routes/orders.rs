//! Order listing.

use axum::{Json, Router, extract::State, routing::get};
use kalakar_core::Order;

use crate::{error::AppError, state::AppState};

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/orders", get(list_orders))
}

/// List every order in the store.
///
/// # Errors
///
/// Returns an error if the order store fails.
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.orders().orders().await?;
    Ok(Json(orders))
}
