//! Business flows.
//!
//! Each flow module declares one operation (schemas, prompt template,
//! optional tool) and adds a typed async method to [`Flows`]. Every method
//! runs the same pipeline: serialize the typed input, validate it, render
//! the prompt, invoke the model, resolve tool calls and deserialize the
//! validated output.

mod description;
mod error;
mod marketing;
mod pricing;
mod sales_insights;
mod tour;
mod translate;
mod trends;

pub use description::{GenerateProductDescriptionInput, GenerateProductDescriptionOutput};
pub use error::FlowError;
pub use marketing::{GetMarketingIdeasInput, GetMarketingIdeasOutput};
pub use pricing::{SuggestProductPriceInput, SuggestProductPriceOutput};
pub use sales_insights::{GetSalesInsightsInput, SalesInsights};
pub use tour::{GetAiPlatformTourInput, GetAiPlatformTourOutput};
pub use translate::{TranslateTextOutput, TranslationPair};
pub use trends::{DiscoverTrendingCraftsInput, DiscoverTrendingCraftsOutput};

/// Registered operation names.
pub mod operations {
    pub use super::description::OPERATION as GENERATE_PRODUCT_DESCRIPTION;
    pub use super::marketing::OPERATION as GET_MARKETING_IDEAS;
    pub use super::pricing::OPERATION as SUGGEST_PRODUCT_PRICE;
    pub use super::sales_insights::OPERATION as GET_SALES_INSIGHTS;
    pub use super::tour::OPERATION as GET_AI_PLATFORM_TOUR;
    pub use super::translate::OPERATION as TRANSLATE_TEXT;
    pub use super::trends::OPERATION as DISCOVER_TRENDING_CRAFTS;
}

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::genai::{GenerationRequest, Generator, ModelClient};
use crate::schema::{Registry, SchemaError, SchemaViolation};
use crate::services::OrderHistory;
use crate::tools::ToolInvocation;

/// Typed flow output plus the tools that ran to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated<O> {
    pub output: O,
    pub tool_invocations: Vec<ToolInvocation>,
}

/// Entry point for every flow.
///
/// Cheap to clone; all clones share one registry and model client.
#[derive(Clone)]
pub struct Flows {
    inner: Arc<FlowsInner>,
}

struct FlowsInner {
    registry: Registry,
    generator: Generator,
}

impl Flows {
    /// Register every operation and bind them to `model`.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if any operation definition is invalid.
    pub fn new(
        model: Arc<dyn ModelClient>,
        orders: Arc<dyn OrderHistory>,
    ) -> Result<Self, SchemaError> {
        let mut registry = Registry::new();
        registry.register(description::operation())?;
        registry.register(pricing::operation())?;
        registry.register(marketing::operation())?;
        registry.register(sales_insights::operation(orders))?;
        registry.register(trends::operation())?;
        registry.register(tour::operation())?;
        registry.register(translate::operation())?;

        Ok(Self {
            inner: Arc::new(FlowsInner {
                registry,
                generator: Generator::new(model),
            }),
        })
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Model identifier the flows run against.
    #[must_use]
    pub fn model(&self) -> &str {
        self.inner.generator.model()
    }

    /// Run a registered operation with typed input and output.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if the operation is unknown, the input is
    /// invalid, or generation fails.
    #[instrument(skip(self, input))]
    pub async fn run<I, O>(&self, operation: &str, input: &I) -> Result<Generated<O>, FlowError>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        let spec = self
            .inner
            .registry
            .get(operation)
            .ok_or_else(|| FlowError::UnknownOperation(operation.to_string()))?;
        let input = serde_json::to_value(input)?;
        let request = GenerationRequest::new(&spec, input)?;
        let response = self.inner.generator.generate(request).await?;

        let output = serde_json::from_value(response.output).map_err(|e| {
            FlowError::SchemaValidation(SchemaViolation::Unparseable(e.to_string()))
        })?;
        Ok(Generated {
            output,
            tool_invocations: response.tool_invocations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryOrderStore;

    struct Unused;

    #[async_trait::async_trait]
    impl ModelClient for Unused {
        fn model(&self) -> &str {
            "unused"
        }

        async fn generate_content(
            &self,
            _request: &crate::genai::GenerateContentRequest,
        ) -> Result<crate::genai::GenerateContentResponse, crate::genai::GenerationError> {
            Err(crate::genai::GenerationError::EmptyResponse)
        }
    }

    fn flows() -> Flows {
        Flows::new(
            Arc::new(Unused),
            Arc::new(InMemoryOrderStore::with_sample_orders()),
        )
        .expect("flows")
    }

    #[test]
    fn test_all_operations_registered() {
        let flows = flows();
        let names: Vec<&str> = flows.registry().names().collect();
        assert_eq!(
            names,
            vec![
                operations::DISCOVER_TRENDING_CRAFTS,
                operations::GENERATE_PRODUCT_DESCRIPTION,
                operations::GET_AI_PLATFORM_TOUR,
                operations::GET_MARKETING_IDEAS,
                operations::GET_SALES_INSIGHTS,
                operations::SUGGEST_PRODUCT_PRICE,
                operations::TRANSLATE_TEXT,
            ]
        );
        assert_eq!(flows.model(), "unused");
    }

    #[test]
    fn test_only_sales_insights_declares_a_tool() {
        let flows = flows();
        for name in flows.registry().names() {
            let spec = flows.registry().get(name).expect("spec");
            let expected = usize::from(name == operations::GET_SALES_INSIGHTS);
            assert_eq!(spec.tools().len(), expected, "{name}");
        }
    }

    #[test]
    fn test_only_platform_tour_carries_safety_settings() {
        let flows = flows();
        let tour = flows
            .registry()
            .get(operations::GET_AI_PLATFORM_TOUR)
            .expect("tour");
        assert_eq!(tour.safety_settings().len(), 4);
        let description = flows
            .registry()
            .get(operations::GENERATE_PRODUCT_DESCRIPTION)
            .expect("description");
        assert!(description.safety_settings().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let err = flows()
            .run::<_, serde_json::Value>("summarizeReviews", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::UnknownOperation(ref n) if n == "summarizeReviews"));
    }

    #[test]
    fn test_flows_is_clone_send_sync() {
        fn assert_traits<T: Clone + Send + Sync>() {}
        assert_traits::<Flows>();
    }
}
