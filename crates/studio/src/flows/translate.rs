//! English to Hindi translation of dashboard strings.
//!
//! One model call per unique string. Duplicates within a batch are
//! collapsed, keeping first-seen order, so the result has one pair per
//! distinct input string. The calls run concurrently and the first failure
//! fails the whole batch.

use std::collections::HashSet;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::schema::{FieldType, OperationDef, Schema};

use super::{FlowError, Flows};

pub const OPERATION: &str = "translateText";

const TEMPLATE: &str = "\
You are a professional translator. Translate the following English text to Hindi.

English Text: {{{text}}}

Provide only the translated Hindi text.";

#[derive(Debug, Serialize)]
struct TranslateOne<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct Translation {
    translation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationPair {
    pub english: String,
    pub hindi: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateTextOutput {
    pub translations: Vec<TranslationPair>,
}

pub(super) fn operation() -> OperationDef {
    let input = Schema::new().field("text", FieldType::String, "The English text to translate.");
    let output = Schema::new().field(
        "translation",
        FieldType::String,
        "The translated text in Hindi.",
    );
    OperationDef::new(OPERATION, input, output, TEMPLATE)
}

/// Distinct strings in first-seen order.
fn unique_in_order(texts: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    texts
        .iter()
        .map(String::as_str)
        .filter(|text| seen.insert(*text))
        .collect()
}

impl Flows {
    /// Translate each distinct string to Hindi.
    ///
    /// An empty batch returns an empty result without calling the model.
    ///
    /// # Errors
    ///
    /// Returns the first `FlowError` among the per-string calls.
    #[instrument(skip(self, texts), fields(texts = texts.len()))]
    pub async fn translate_text(&self, texts: Vec<String>) -> Result<TranslateTextOutput, FlowError> {
        let unique = unique_in_order(&texts);
        if unique.is_empty() {
            return Ok(TranslateTextOutput::default());
        }
        debug!(unique = unique.len(), "translating batch");

        let calls = unique.iter().map(|&text| async move {
            let generated = self
                .run::<_, Translation>(OPERATION, &TranslateOne { text })
                .await?;
            Ok::<_, FlowError>(TranslationPair {
                english: text.to_string(),
                hindi: generated.output.translation,
            })
        });

        Ok(TranslateTextOutput {
            translations: try_join_all(calls).await?,
        })
    }
}
