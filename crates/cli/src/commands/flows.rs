//! Flow subcommands.
//!
//! # Usage
//!
//! ```bash
//! kalakar describe -p "Blue Pottery Vase" -c "Hand-thrown in Jaipur" \
//!     -s "Persian glaze tradition" -a "Collectors"
//! kalakar insights -p "Handwoven Pashmina Shawl" -a artisan-7 \
//!     --current-price 6500 --average-order-value 7000 \
//!     --regional-demand "High in Delhi" --new-item-volume 10
//! kalakar translate Orders Dashboard "Sales Insights"
//! ```
//!
//! Every subcommand prints the flow output as pretty JSON.

use kalakar_core::ArtisanId;
use kalakar_studio::flows::{
    DiscoverTrendingCraftsInput, GenerateProductDescriptionInput, GetAiPlatformTourInput,
    GetMarketingIdeasInput, GetSalesInsightsInput, SuggestProductPriceInput,
};
use serde::Serialize;
use tracing::info;

use super::{CommandError, connect, print_json};

pub async fn describe(input: GenerateProductDescriptionInput) -> Result<(), CommandError> {
    let output = connect()?.generate_product_description(input).await?;
    print_json(&output)
}

pub async fn price(input: SuggestProductPriceInput) -> Result<(), CommandError> {
    let output = connect()?.suggest_product_price(input).await?;
    print_json(&output)
}

pub async fn marketing(input: GetMarketingIdeasInput) -> Result<(), CommandError> {
    let output = connect()?.get_marketing_ideas(input).await?;
    print_json(&output)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsightsReport {
    insights: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    items_sold_volume: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inventory_imbalance: Option<bool>,
}

/// Sales insights plus the inventory imbalance flag when units sold are known.
pub async fn insights(
    product_name: String,
    artisan_id: &str,
    current_price: f64,
    average_order_value: f64,
    regional_demand: String,
    new_item_volume: u64,
) -> Result<(), CommandError> {
    let insights = connect()?
        .get_sales_insights(GetSalesInsightsInput {
            product_name,
            artisan_id: ArtisanId::new(artisan_id),
            current_price,
            average_order_value,
            regional_demand,
            new_item_volume,
        })
        .await?;

    let inventory_imbalance = insights.inventory_imbalance(new_item_volume);
    if inventory_imbalance == Some(true) {
        info!(new_item_volume, "More items made than sold");
    }

    print_json(&InsightsReport {
        insights: insights.insights,
        items_sold_volume: insights.items_sold_volume,
        inventory_imbalance,
    })
}

pub async fn trends(input: DiscoverTrendingCraftsInput) -> Result<(), CommandError> {
    let output = connect()?.discover_trending_crafts(input).await?;
    print_json(&output)
}

pub async fn tour(input: GetAiPlatformTourInput) -> Result<(), CommandError> {
    let output = connect()?.get_ai_platform_tour(input).await?;
    print_json(&output)
}

/// Translate each text to Hindi. Duplicates are translated once.
pub async fn translate(texts: Vec<String>) -> Result<(), CommandError> {
    let output = connect()?.translate_text(texts).await?;
    print_json(&output)
}
