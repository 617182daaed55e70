//! Product description copywriting.

use serde::{Deserialize, Serialize};

use crate::schema::{FieldType, OperationDef, Schema};

use super::{FlowError, Flows};

pub const OPERATION: &str = "generateProductDescription";

const TEMPLATE: &str = "\
You are an expert marketing copywriter specializing in compelling product descriptions for artisan crafts. Your goal is to highlight the craftsmanship and cultural significance of each product to attract more customers.

Product Name: {{{productName}}}
Craftsmanship Details: {{{craftsmanshipDetails}}}
Cultural Significance: {{{culturalSignificance}}}
Target Audience: {{{targetAudience}}}

Write a product description that is engaging, informative, and persuasive. Focus on the unique aspects of the product and its appeal to the target audience. The description should be no more than 150 words.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProductDescriptionInput {
    pub product_name: String,
    pub craftsmanship_details: String,
    pub cultural_significance: String,
    pub target_audience: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProductDescriptionOutput {
    pub product_description: String,
}

pub(super) fn operation() -> OperationDef {
    let input = Schema::new()
        .field("productName", FieldType::String, "The name of the product.")
        .field(
            "craftsmanshipDetails",
            FieldType::String,
            "Details about the craftsmanship involved in making the product.",
        )
        .field(
            "culturalSignificance",
            FieldType::String,
            "The cultural significance of the product.",
        )
        .field(
            "targetAudience",
            FieldType::String,
            "Description of the ideal customer for this product.",
        );
    let output = Schema::new().field(
        "productDescription",
        FieldType::String,
        "A compelling product description that highlights the craftsmanship and cultural significance of the product.",
    );
    OperationDef::new(OPERATION, input, output, TEMPLATE)
}

impl Flows {
    /// Write a product description of at most about 150 words.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if generation fails or the answer is malformed.
    pub async fn generate_product_description(
        &self,
        input: GenerateProductDescriptionInput,
    ) -> Result<GenerateProductDescriptionOutput, FlowError> {
        Ok(self.run(OPERATION, &input).await?.output)
    }
}
