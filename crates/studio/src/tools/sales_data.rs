//! Units-sold lookup used by the sales-insights flow.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{FieldType, Schema};
use crate::services::OrderHistory;

use super::{ToolError, ToolHandler, ToolSpec};

/// Name the model uses to call the tool.
pub const SALES_DATA_TOOL: &str = "getSalesDataForProduct";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalesDataInput {
    product_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SalesDataOutput {
    items_sold_volume: u64,
}

/// Counts past non-cancelled sales of a product.
pub struct SalesDataTool {
    orders: Arc<dyn OrderHistory>,
}

impl SalesDataTool {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderHistory>) -> Self {
        Self { orders }
    }

    /// Tool declaration backed by `orders`.
    #[must_use]
    pub fn spec(orders: Arc<dyn OrderHistory>) -> ToolSpec {
        ToolSpec {
            name: SALES_DATA_TOOL.to_string(),
            description: "Retrieves the total volume of items sold for a specific product from past orders."
                .to_string(),
            input: Schema::new().field(
                "productName",
                FieldType::String,
                "The name of the product to get sales data for.",
            ),
            output: Schema::new().field(
                "itemsSoldVolume",
                FieldType::Number,
                "The total number of units sold for this product.",
            ),
            handler: Arc::new(Self::new(orders)),
        }
    }
}

#[async_trait]
impl ToolHandler for SalesDataTool {
    async fn call(&self, input: Value) -> Result<Value, ToolError> {
        let input: SalesDataInput =
            serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        let items_sold_volume = self
            .orders
            .sales_volume_for_product(&input.product_name)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        serde_json::to_value(SalesDataOutput { items_sold_volume })
            .map_err(|e| ToolError::Execution(e.to_string()))
    }
}
