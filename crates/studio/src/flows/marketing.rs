//! Event and festival marketing ideas.

use serde::{Deserialize, Serialize};

use crate::schema::{FieldType, OperationDef, Schema};

use super::{FlowError, Flows};

pub const OPERATION: &str = "getMarketingIdeas";

const TEMPLATE: &str = "\
You are a marketing expert specializing in promoting artisanal products at events and festivals.

Based on the event details and the artisan's product information, generate a list of marketing ideas to help the artisan effectively promote their products and reach a wider audience.

Event Details: {{{eventDetails}}}
Artisan Products: {{{artisanProducts}}}

Provide a list of diverse and creative marketing ideas. Each idea should be concise and actionable.

Example:
- Create a visually appealing booth showcasing the cultural significance of the products.
- Offer interactive demonstrations of the crafting process to engage attendees.
- Partner with local influencers to promote the products on social media.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMarketingIdeasInput {
    pub event_details: String,
    pub artisan_products: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMarketingIdeasOutput {
    pub marketing_ideas: Vec<String>,
}

pub(super) fn operation() -> OperationDef {
    let input = Schema::new()
        .field(
            "eventDetails",
            FieldType::String,
            "Details about the upcoming event or festival, including name, date, and theme.",
        )
        .field(
            "artisanProducts",
            FieldType::String,
            "Information about the artisan's products, including descriptions, materials, and cultural significance.",
        );
    let output = Schema::new().field(
        "marketingIdeas",
        FieldType::array_of(FieldType::String),
        "A list of marketing ideas tailored for the artisan and the event.",
    );
    OperationDef::new(OPERATION, input, output, TEMPLATE)
}

impl Flows {
    /// Marketing ideas for an upcoming event, in the order the model gave them.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if generation fails or the answer is malformed.
    pub async fn get_marketing_ideas(
        &self,
        input: GetMarketingIdeasInput,
    ) -> Result<GetMarketingIdeasOutput, FlowError> {
        Ok(self.run(OPERATION, &input).await?.output)
    }
}
