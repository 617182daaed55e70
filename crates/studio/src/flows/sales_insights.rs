//! Sales insights and pricing strategy, backed by the units-sold tool.

use std::sync::Arc;

use kalakar_core::ArtisanId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{FieldType, OperationDef, Schema};
use crate::services::OrderHistory;
use crate::tools::{SALES_DATA_TOOL, SalesDataTool};

use super::{FlowError, Flows};

pub const OPERATION: &str = "getSalesInsights";

const TEMPLATE: &str = "\
You are an AI-powered sales analysis tool for artisans.

Based on the following information, provide sales insights and suggest optimal pricing strategies for the product.

To get the number of items sold, you MUST use the 'getSalesDataForProduct' tool. Do not ask the user for this information.

Product Name: {{{productName}}}
Artisan ID: {{{artisanId}}}
Current Price: {{{currentPrice}}}
Average Order Value: {{{averageOrderValue}}}
Regional Demand: {{{regionalDemand}}}
New Item Volume: {{{newItemVolume}}}

Analyze this data and provide actionable insights to help the artisan make better decisions and increase sales. If the volume of new items created exceeds the number of items sold, highlight this and suggest strategies to address the imbalance.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSalesInsightsInput {
    pub product_name: String,
    pub artisan_id: ArtisanId,
    pub current_price: f64,
    pub average_order_value: f64,
    pub regional_demand: String,
    /// Units produced in the period under review.
    pub new_item_volume: u64,
}

#[derive(Debug, Deserialize)]
struct InsightsAnswer {
    insights: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesInsights {
    pub insights: String,
    /// Units sold, present only when the model called the units-sold tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_sold_volume: Option<u64>,
}

impl SalesInsights {
    /// Whether more items were made than sold.
    ///
    /// `None` when the units sold are unknown.
    #[must_use]
    pub fn inventory_imbalance(&self, new_item_volume: u64) -> Option<bool> {
        self.items_sold_volume.map(|sold| new_item_volume > sold)
    }
}

pub(super) fn operation(orders: Arc<dyn OrderHistory>) -> OperationDef {
    let input = Schema::new()
        .field("productName", FieldType::String, "The name of the product.")
        .field("artisanId", FieldType::String, "The ID of the artisan.")
        .field("currentPrice", FieldType::Number, "The current price of the product.")
        .field(
            "averageOrderValue",
            FieldType::Number,
            "The current average order value for the product.",
        )
        .field(
            "regionalDemand",
            FieldType::String,
            "Information about the regional demand for the product.",
        )
        .field(
            "newItemVolume",
            FieldType::Number,
            "The number of new items created within a defined period.",
        );
    let output = Schema::new()
        .field(
            "insights",
            FieldType::String,
            "Sales insights and optimal pricing strategies for the product.",
        )
        .optional_field(
            "itemsSoldVolume",
            FieldType::Number,
            "The number of items sold, if fetched.",
        );
    OperationDef::new(OPERATION, input, output, TEMPLATE).with_tool(SalesDataTool::spec(orders))
}

impl Flows {
    /// Sales insights for one product.
    ///
    /// `items_sold_volume` comes only from the first tool that ran during
    /// the call, and only if that tool was the units-sold tool. Calls to
    /// undeclared tools never run, so they do not count as first. A number
    /// the model writes into its answer is ignored.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if generation or the tool fails, or the answer is
    /// malformed.
    pub async fn get_sales_insights(
        &self,
        input: GetSalesInsightsInput,
    ) -> Result<SalesInsights, FlowError> {
        let generated = self.run::<_, InsightsAnswer>(OPERATION, &input).await?;

        let items_sold_volume = generated
            .tool_invocations
            .first()
            .filter(|invocation| invocation.tool == SALES_DATA_TOOL)
            .and_then(|invocation| invocation.output["itemsSoldVolume"].as_u64());
        debug!(?items_sold_volume, tool_calls = generated.tool_invocations.len(), "sales insights assembled");

        Ok(SalesInsights {
            insights: generated.output.insights,
            items_sold_volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_imbalance() {
        let insights = SalesInsights {
            insights: "Reduce production".to_string(),
            items_sold_volume: Some(35),
        };
        assert_eq!(insights.inventory_imbalance(50), Some(true));
        assert_eq!(insights.inventory_imbalance(35), Some(false));
        assert_eq!(insights.inventory_imbalance(10), Some(false));
    }

    #[test]
    fn test_inventory_imbalance_unknown_without_volume() {
        let insights = SalesInsights {
            insights: "No data".to_string(),
            items_sold_volume: None,
        };
        assert_eq!(insights.inventory_imbalance(50), None);
    }

    #[test]
    fn test_absent_volume_is_not_serialized() {
        let insights = SalesInsights {
            insights: "x".to_string(),
            items_sold_volume: None,
        };
        let json = serde_json::to_value(&insights).expect("serialize");
        assert!(json.get("itemsSoldVolume").is_none());
    }
}
