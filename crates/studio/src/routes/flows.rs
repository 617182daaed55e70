//! Flow endpoints.
//!
//! Each handler deserializes the typed flow input, runs the flow and
//! returns its output. Malformed bodies are 400s; any generation failure is
//! a 502 with a generic message (see [`AppError`]).

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};

use crate::flows::{
    DiscoverTrendingCraftsInput, DiscoverTrendingCraftsOutput, GenerateProductDescriptionInput,
    GenerateProductDescriptionOutput, GetAiPlatformTourInput, GetAiPlatformTourOutput,
    GetMarketingIdeasInput, GetMarketingIdeasOutput, GetSalesInsightsInput, SalesInsights,
    SuggestProductPriceInput, SuggestProductPriceOutput, TranslateTextOutput,
};
use crate::{error::AppError, state::AppState};

/// Build the flows router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/flows/product-description", post(product_description))
        .route("/api/flows/product-price", post(product_price))
        .route("/api/flows/marketing-ideas", post(marketing_ideas))
        .route("/api/flows/sales-insights", post(sales_insights))
        .route("/api/flows/trending-crafts", post(trending_crafts))
        .route("/api/flows/platform-tour", post(platform_tour))
        .route("/api/flows/translate", post(translate))
}

/// Request body for batch translation.
#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub texts: Vec<String>,
}

/// Sales insights plus the derived inventory-imbalance flag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesInsightsResponse {
    #[serde(flatten)]
    pub insights: SalesInsights,
    /// `null` when units sold are unknown.
    pub inventory_imbalance: Option<bool>,
}

/// Generate a product description.
///
/// # Errors
///
/// Returns an error if the body is invalid or generation fails.
pub async fn product_description(
    State(state): State<AppState>,
    payload: Result<Json<GenerateProductDescriptionInput>, JsonRejection>,
) -> Result<Json<GenerateProductDescriptionOutput>, AppError> {
    let Json(input) = payload?;
    Ok(Json(state.flows().generate_product_description(input).await?))
}

/// Suggest a product price.
///
/// # Errors
///
/// Returns an error if the body is invalid or generation fails.
pub async fn product_price(
    State(state): State<AppState>,
    payload: Result<Json<SuggestProductPriceInput>, JsonRejection>,
) -> Result<Json<SuggestProductPriceOutput>, AppError> {
    let Json(input) = payload?;
    Ok(Json(state.flows().suggest_product_price(input).await?))
}

/// Generate marketing ideas for an event.
///
/// # Errors
///
/// Returns an error if the body is invalid or generation fails.
pub async fn marketing_ideas(
    State(state): State<AppState>,
    payload: Result<Json<GetMarketingIdeasInput>, JsonRejection>,
) -> Result<Json<GetMarketingIdeasOutput>, AppError> {
    let Json(input) = payload?;
    Ok(Json(state.flows().get_marketing_ideas(input).await?))
}

/// Sales insights for a product.
///
/// # Errors
///
/// Returns an error if the body is invalid, the tool fails or generation fails.
pub async fn sales_insights(
    State(state): State<AppState>,
    payload: Result<Json<GetSalesInsightsInput>, JsonRejection>,
) -> Result<Json<SalesInsightsResponse>, AppError> {
    let Json(input) = payload?;
    let new_item_volume = input.new_item_volume;
    let insights = state.flows().get_sales_insights(input).await?;
    let inventory_imbalance = insights.inventory_imbalance(new_item_volume);
    Ok(Json(SalesInsightsResponse {
        insights,
        inventory_imbalance,
    }))
}

/// Discover trending crafts.
///
/// # Errors
///
/// Returns an error if the body is invalid or generation fails.
pub async fn trending_crafts(
    State(state): State<AppState>,
    payload: Result<Json<DiscoverTrendingCraftsInput>, JsonRejection>,
) -> Result<Json<DiscoverTrendingCraftsOutput>, AppError> {
    let Json(input) = payload?;
    Ok(Json(state.flows().discover_trending_crafts(input).await?))
}

/// Generate an onboarding tour.
///
/// # Errors
///
/// Returns an error if the body is invalid or generation fails.
pub async fn platform_tour(
    State(state): State<AppState>,
    payload: Result<Json<GetAiPlatformTourInput>, JsonRejection>,
) -> Result<Json<GetAiPlatformTourOutput>, AppError> {
    let Json(input) = payload?;
    Ok(Json(state.flows().get_ai_platform_tour(input).await?))
}

/// Translate dashboard strings to Hindi.
///
/// # Errors
///
/// Returns an error if the body is invalid or any translation fails.
pub async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateTextOutput>, AppError> {
    let Json(request) = payload?;
    Ok(Json(state.flows().translate_text(request.texts).await?))
}
