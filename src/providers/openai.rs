use std::time::Duration;
use serde::{Serialize, Deserialize};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;
use log::error;

use crate::errors::ProviderError;
use super::{Generation, LanguageModel};

/// Default Azure OpenAI REST API version
pub const DEFAULT_AZURE_API_VERSION: &str = "2023-05-15";

/// How requests are addressed and authenticated
#[derive(Debug, Clone, PartialEq)]
enum Flavor {
    /// `{endpoint}/chat/completions` with a bearer token
    Standard,
    /// `{endpoint}/openai/deployments/{model}/chat/completions?api-version=..` with an `api-key` header
    Azure { api_version: String },
}

/// OpenAI-compatible chat completions client
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL
    endpoint: String,
    /// Model name, or deployment name for Azure
    model: String,
    /// Sampling temperature
    temperature: f32,
    flavor: Flavor,
}

/// Chat completion request
#[derive(Debug, Serialize, Default)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Deserialize, Default)]
pub struct OpenAIUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Single completion choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

impl OpenAIRequest {
    /// Create a new request for `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the completion token limit
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl OpenAI {
    /// Create a client for the public OpenAI API or any compatible server
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: String::new(),
            temperature: 0.3,
            flavor: Flavor::Standard,
        }
    }

    /// Create a client for an Azure OpenAI resource
    pub fn azure(api_key: impl Into<String>, endpoint: impl Into<String>, api_version: &str, timeout_secs: u64) -> Self {
        let api_version = if api_version.is_empty() { DEFAULT_AZURE_API_VERSION } else { api_version };
        Self {
            flavor: Flavor::Azure { api_version: api_version.to_string() },
            ..Self::new(api_key, endpoint, timeout_secs)
        }
    }

    /// Set model (deployment for Azure) and temperature
    pub fn with_model(mut self, model: &str, temperature: f32) -> Self {
        self.model = model.to_string();
        self.temperature = temperature;
        self
    }

    /// Full URL of the chat completions route
    pub fn completions_url(&self) -> Result<Url, ProviderError> {
        let base = if self.endpoint.is_empty() {
            "https://api.openai.com/v1"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        let base = Url::parse(&format!("{}/", base))
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid endpoint '{}': {}", self.endpoint, e)))?;

        match &self.flavor {
            Flavor::Standard => base
                .join("chat/completions")
                .map_err(|e| ProviderError::RequestFailed(e.to_string())),
            Flavor::Azure { api_version } => {
                let mut url = base
                    .join(&format!("openai/deployments/{}/chat/completions", self.model))
                    .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
                url.query_pairs_mut().append_pair("api-version", api_version);
                Ok(url)
            }
        }
    }

    /// Complete a chat request
    pub async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let url = self.completions_url()?;
        let builder = self.client.post(url).json(&request);
        let builder = match self.flavor {
            Flavor::Standard => builder.bearer_auth(&self.api_key),
            Flavor::Azure { .. } => builder.header("api-key", &self.api_key),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send request to OpenAI API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        response.json::<OpenAIResponse>().await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e)))
    }

    /// Extract text from the first choice
    pub fn extract_text_from_response(response: &OpenAIResponse) -> String {
        response.choices.first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for OpenAI {
    async fn generate(&self, prompt: &str, system_prompt: Option<&str>) -> Result<Generation, ProviderError> {
        let mut request = OpenAIRequest::new(&self.model).temperature(self.temperature);
        if let Some(system) = system_prompt {
            request = request.add_message("system", system);
        }
        request = request.add_message("user", prompt);

        let response = self.complete(request).await?;
        let text = Self::extract_text_from_response(&response);
        let usage = response.usage.unwrap_or_default();

        Ok(Generation {
            text,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
