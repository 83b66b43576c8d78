//! Answer-quality heuristic deciding whether LATS searches deeper.

use regex::Regex;
use tracing::warn;

/// Flags answers that are too short or contain a hedge word (whole word, any case).
#[derive(Debug, Clone)]
pub struct HedgeDetector {
    pattern: Option<Regex>,
    min_chars: usize,
}

impl HedgeDetector {
    pub fn new(words: &[String], min_chars: usize) -> Self {
        let alternatives: Vec<String> = words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();
        let pattern = if alternatives.is_empty() {
            None
        } else {
            match Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(error = %e, "invalid hedge word pattern, hedge detection disabled");
                    None
                }
            }
        };
        Self { pattern, min_chars }
    }

    /// True when the answer should not be accepted as final yet.
    pub fn needs_more(&self, answer: &str) -> bool {
        let answer = answer.trim();
        if answer.chars().count() < self.min_chars {
            return true;
        }
        self.pattern.as_ref().is_some_and(|re| re.is_match(answer))
    }
}
