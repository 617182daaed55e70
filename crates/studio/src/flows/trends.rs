//! Market trend analysis for the craft industry.

use serde::{Deserialize, Serialize};

use crate::schema::{FieldType, OperationDef, Schema};

use super::{FlowError, Flows};

pub const OPERATION: &str = "discoverTrendingCrafts";

const TEMPLATE: &str = "\
You are an expert market analyst in the craft industry.

You will analyze the provided data to identify current market trends and consumer preferences. Based on your analysis, provide insights into trending crafts, consumer preferences, market gaps and regional demand.

Recent Sales Data: {{{recentSalesData}}}
Consumer Feedback: {{{consumerFeedback}}}
Demographic Data: {{{demographicData}}}

Your analysis should be detailed and actionable, giving artisans valuable information to guide their product development and marketing strategies.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverTrendingCraftsInput {
    pub recent_sales_data: String,
    pub consumer_feedback: String,
    pub demographic_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverTrendingCraftsOutput {
    pub trending_crafts: String,
    pub consumer_preferences: String,
    pub market_gaps: String,
    pub regional_demand: String,
}

pub(super) fn operation() -> OperationDef {
    let input = Schema::new()
        .field(
            "recentSalesData",
            FieldType::String,
            "A summary of the recent sales data, including product types, quantities sold, and regions.",
        )
        .field(
            "consumerFeedback",
            FieldType::String,
            "A collection of recent customer feedback, reviews, and survey responses related to craft products.",
        )
        .field(
            "demographicData",
            FieldType::String,
            "Demographic data of craft consumers, including age, location, and income level.",
        );
    let output = Schema::new()
        .field(
            "trendingCrafts",
            FieldType::String,
            "A summary of the current trending crafts, including specific product types and styles.",
        )
        .field(
            "consumerPreferences",
            FieldType::String,
            "An analysis of consumer preferences, including popular materials, colors, and design elements.",
        )
        .field(
            "marketGaps",
            FieldType::String,
            "Gaps in the market where demand is not being adequately met by current offerings.",
        )
        .field(
            "regionalDemand",
            FieldType::String,
            "An overview of regional demand for different types of crafts, highlighting areas with high growth potential.",
        );
    OperationDef::new(OPERATION, input, output, TEMPLATE)
}

impl Flows {
    /// Analyse sales, feedback and demographics for craft trends.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if generation fails or the answer is malformed.
    pub async fn discover_trending_crafts(
        &self,
        input: DiscoverTrendingCraftsInput,
    ) -> Result<DiscoverTrendingCraftsOutput, FlowError> {
        Ok(self.run(OPERATION, &input).await?.output)
    }
}
