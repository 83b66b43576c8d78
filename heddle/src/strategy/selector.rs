//! LLM-assisted strategy recommendation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::extract_json_object;

use super::StrategySummary;

/// Strategy used when the model gives no usable recommendation.
const DEFAULT_STRATEGY: &str = "react";
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Suggested strategy for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub strategy: String,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub reasoning: String,
}

impl Recommendation {
    fn fallback(reasoning: impl Into<String>) -> Self {
        Self {
            strategy: DEFAULT_STRATEGY.to_string(),
            confidence: DEFAULT_CONFIDENCE,
            reasoning: reasoning.into(),
        }
    }
}

/// Asks the model which registered strategy fits a query best.
///
/// Never fails: an LLM error, unparseable reply or unknown strategy name yields
/// `react` with confidence 0.5.
pub struct PatternSelector {
    llm: Arc<dyn LlmClient>,
}

impl PatternSelector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn select(&self, query: &str, available: &[StrategySummary]) -> Recommendation {
        let catalog = available
            .iter()
            .map(|s| format!("- {}: {}", s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Choose the reasoning strategy best suited to the user's request.\n\n\
             Strategies:\n{catalog}\n\n\
             Respond with JSON only: {{\"strategy\": \"<name>\", \"confidence\": <0..1>, \"reasoning\": \"<one sentence>\"}}"
        );
        let messages = [Message::system(prompt), Message::user(query)];

        let response = match self.llm.invoke(&messages).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "strategy selection failed");
                return Recommendation::fallback(format!("selection failed: {}", e));
            }
        };
        let parsed = extract_json_object(&response.content)
            .and_then(|json| serde_json::from_str::<Recommendation>(json).ok());
        match parsed {
            Some(mut rec) if available.iter().any(|s| s.name == rec.strategy) => {
                rec.confidence = rec.confidence.clamp(0.0, 1.0);
                debug!(strategy = %rec.strategy, confidence = rec.confidence, "strategy recommended");
                rec
            }
            Some(rec) => Recommendation::fallback(format!("unknown strategy '{}'", rec.strategy)),
            None => Recommendation::fallback("no usable recommendation"),
        }
    }
}
