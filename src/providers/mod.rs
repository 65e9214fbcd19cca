/*!
 * Language model clients.
 *
 * The workflow talks to every model through the `LanguageModel` trait, so the
 * translator, evaluator and optimizer roles can each be backed by a different
 * provider:
 * - OpenAI: OpenAI-compatible chat completions, including Azure deployments
 * - Anthropic: Anthropic Messages API
 * - Mock: deterministic offline model for dry runs and tests
 */

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{ModelConfig, ProviderKind};
use crate::errors::ProviderError;

pub mod anthropic;
pub mod mock;
pub mod openai;

/// Text produced by one model call, with its token accounting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Generation {
    pub fn new(text: impl Into<String>, prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            text: text.into(),
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Common trait for all language model clients
///
/// This trait defines the single capability the translation workflow needs,
/// allowing providers to be used interchangeably for every role.
#[async_trait]
pub trait LanguageModel: Send + Sync + Debug {
    /// Generate a completion for `prompt`, optionally steered by a system prompt
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<Generation, ProviderError>;

    /// Model identifier, used in the model mapping report
    fn model_name(&self) -> &str;
}

/// Build the client described by `config`
pub fn create_model(config: &ModelConfig) -> Result<Arc<dyn LanguageModel>> {
    debug!("Creating {} client for model {}", config.provider, config.model);
    let model: Arc<dyn LanguageModel> = match config.provider {
        ProviderKind::OpenAI => {
            let api_key = config.resolved_api_key()
                .ok_or_else(|| anyhow!("OpenAI API key is required (set api_key or OPENAI_API_KEY)"))?;
            Arc::new(openai::OpenAI::new(api_key, config.resolved_endpoint(), config.timeout_secs)
                .with_model(&config.model, config.temperature))
        }
        ProviderKind::Azure => {
            let api_key = config.resolved_api_key()
                .ok_or_else(|| anyhow!("Azure API key is required (set api_key or AZURE_OPENAI_API_KEY)"))?;
            let endpoint = config.resolved_endpoint();
            if endpoint.is_empty() {
                return Err(anyhow!("Azure endpoint is required (set endpoint or AZURE_OPENAI_ENDPOINT)"));
            }
            Arc::new(openai::OpenAI::azure(api_key, endpoint, &config.api_version, config.timeout_secs)
                .with_model(&config.model, config.temperature))
        }
        ProviderKind::Anthropic => {
            let api_key = config.resolved_api_key()
                .ok_or_else(|| anyhow!("Anthropic API key is required (set api_key or ANTHROPIC_API_KEY)"))?;
            Arc::new(anthropic::Anthropic::new(api_key, config.resolved_endpoint())
                .with_model(&config.model, config.temperature))
        }
        ProviderKind::Mock => Arc::new(mock::MockModel::working().with_name(&config.model)),
    };
    Ok(model)
}
