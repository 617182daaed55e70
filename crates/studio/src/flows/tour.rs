//! Onboarding tour for new artisans.

use serde::{Deserialize, Serialize};

use crate::genai::{HarmBlockThreshold, HarmCategory, SafetySetting};
use crate::schema::{FieldType, OperationDef, Schema};

use super::{FlowError, Flows};

pub const OPERATION: &str = "getAiPlatformTour";

const TEMPLATE: &str = "\
You are an AI-powered guide for a platform that helps artisans sell their crafts online.

Use the following information to generate a tailored interactive website tour for the artisan, as well as some additional tips.

User Behavior: {{{userBehavior}}}
Support Need: {{{supportNeed}}}

Based on the user's behavior and support needs, generate an array of tour steps that will guide the user through the platform's features.
Also generate an array of additional tips that will help the user get the most out of the platform.

Ensure the tour steps are clear, concise and actionable, and the additional tips relevant and helpful.

Output the tour steps and additional tips as JSON arrays of strings.";

const SAFETY_SETTINGS: [SafetySetting; 4] = [
    SafetySetting::new(HarmCategory::HateSpeech, HarmBlockThreshold::BlockOnlyHigh),
    SafetySetting::new(HarmCategory::DangerousContent, HarmBlockThreshold::BlockNone),
    SafetySetting::new(HarmCategory::Harassment, HarmBlockThreshold::BlockMediumAndAbove),
    SafetySetting::new(HarmCategory::SexuallyExplicit, HarmBlockThreshold::BlockLowAndAbove),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAiPlatformTourInput {
    pub user_behavior: String,
    pub support_need: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAiPlatformTourOutput {
    pub tour_steps: Vec<String>,
    pub additional_tips: Vec<String>,
}

pub(super) fn operation() -> OperationDef {
    let input = Schema::new()
        .field(
            "userBehavior",
            FieldType::String,
            "The user's behavior on the platform, including pages visited, actions taken, and time spent on each page.",
        )
        .field(
            "supportNeed",
            FieldType::String,
            "The user's indicated support need, including questions asked, help articles viewed, and support tickets submitted.",
        );
    let output = Schema::new()
        .field(
            "tourSteps",
            FieldType::array_of(FieldType::String),
            "Each string is one step of the interactive website tour, tailored to the user behavior and support need.",
        )
        .field(
            "additionalTips",
            FieldType::array_of(FieldType::String),
            "Each string is an additional tip or suggestion, tailored to the user behavior and support need.",
        );
    OperationDef::new(OPERATION, input, output, TEMPLATE)
        .with_safety_settings(SAFETY_SETTINGS.to_vec())
}

impl Flows {
    /// Tour steps and tips tailored to how an artisan uses the platform.
    ///
    /// # Errors
    ///
    /// Returns `FlowError` if generation fails, is blocked by the safety
    /// filter, or the answer is malformed.
    pub async fn get_ai_platform_tour(
        &self,
        input: GetAiPlatformTourInput,
    ) -> Result<GetAiPlatformTourOutput, FlowError> {
        Ok(self.run(OPERATION, &input).await?.output)
    }
}
