//! Retail price suggestions in INR.

use serde::{Deserialize, Serialize};

use crate::schema::{FieldType, OperationDef, Schema};

use super::{FlowError, Flows};

pub const OPERATION: &str = "suggestProductPrice";

const TEMPLATE: &str = "\
You are an expert pricing analyst for artisanal crafts in the Indian market. Your goal is to suggest a competitive and fair price for a new product based on its details.

Analyze the following product information:
Product Name: {{{productName}}}
Description: {{{description}}}
Category: {{{category}}}

Based on this information, suggest a retail price in Indian Rupees (INR). Also provide a short justification for your suggestion, considering perceived value, craftsmanship, materials (if mentioned), category norms and the target audience within India. The price should be a number only.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestProductPriceInput {
    pub product_name: String,
    pub description: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestProductPriceOutput {
    /// Suggested retail price in rupees.
    pub suggested_price: f64,
    pub justification: String,
}

pub(super) fn operation() -> OperationDef {
    let input = Schema::new()
        .field("productName", FieldType::String, "The name of the product.")
        .field("description", FieldType::String, "The description of the product.")
        .field("category", FieldType::String, "The category of the product.");
    let output = Schema::new()
        .field(
            "suggestedPrice",
            FieldType::Number,
            "The suggested retail price for the product in Indian Rupees (INR).",
        )
        .field(
            "justification",
            FieldType::String,
            "A brief justification for the suggested price, considering the product details and Indian market context.",
        );
    OperationDef::new(OPERATION, input, output, TEMPLATE)
}

impl Flows {
    /// Suggest a retail price in INR with a short justification.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if generation fails or the answer is malformed.
    pub async fn suggest_product_price(
        &self,
        input: SuggestProductPriceInput,
    ) -> Result<SuggestProductPriceOutput, FlowError> {
        Ok(self.run(OPERATION, &input).await?.output)
    }
}
