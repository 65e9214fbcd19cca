/*!
 * Mock language model for offline runs and testing.
 *
 * The working mock answers by recognizing which role prompt it was given:
 * - comparative evaluation prompts get a JSON verdict preferring model C
 * - single evaluation prompts get a fixed JSON score
 * - optimizer prompts get "Optimized Mock Translation"
 * - anything else is treated as a translation request
 *
 * Other behaviors simulate failing, flaky and slow providers.
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use super::{Generation, LanguageModel};

/// Text returned for translation requests
pub const MOCK_TRANSLATION: &str = "Mock Translation";

/// Text returned for optimization requests
pub const MOCK_OPTIMIZATION: &str = "Optimized Mock Translation";

/// Behavior mode for the mock model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock model for testing workflow behavior
#[derive(Debug)]
pub struct MockModel {
    /// Behavior mode
    behavior: MockBehavior,
    /// Reported model name
    name: String,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
}

impl MockModel {
    /// Create a new mock model with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            name: "mock".to_string(),
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock model that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock model
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create a failing mock model that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that answers after `delay_ms`
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set the reported model name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Canned answer for the role the prompt belongs to
    pub fn respond(prompt: &str, system_prompt: Option<&str>) -> String {
        let system = system_prompt.unwrap_or_default();
        if prompt.contains("Model A Translation") {
            r#"{
    "detected_source_lang": "English",
    "model_a": {"accuracy": 8, "fluency": 8, "consistency": 8, "terminology": 8, "completeness": 8, "suggestions": "Good."},
    "model_c": {"accuracy": 9, "fluency": 9, "consistency": 9, "terminology": 9, "completeness": 9, "suggestions": "Better."}
}"#
            .to_string()
        } else if prompt.contains("Evaluate") {
            r#"{"detected_source_lang": "English", "accuracy": 8, "fluency": 9, "consistency": 8, "terminology": 8, "completeness": 9, "suggestions": "不错，但可以更流畅。"}"#
                .to_string()
        } else if system.contains("optimizer") {
            MOCK_OPTIMIZATION.to_string()
        } else {
            MOCK_TRANSLATION.to_string()
        }
    }
}

impl Clone for MockModel {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            name: self.name.clone(),
            request_count: Arc::clone(&self.request_count),
        }
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<Generation, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(Generation::new(Self::respond(prompt, system_prompt), 10, 10)),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(Generation::new(Self::respond(prompt, system_prompt), 10, 10))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(Generation::new(Self::respond(prompt, system_prompt), 10, 10))
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
