use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;

use crate::translation::prompts::NumberFormatRule;
use crate::translation::retry::RetryPolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language name or ISO code, or "auto"
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language name or ISO code
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Model producing the initial translation (model A)
    #[serde(default = "ModelConfig::default_translator")]
    pub translation: ModelConfig,

    /// Model scoring translations (model B)
    #[serde(default = "ModelConfig::default_evaluator")]
    pub evaluation: ModelConfig,

    /// Model refining translations (model C)
    #[serde(default = "ModelConfig::default_optimizer")]
    pub optimization: ModelConfig,

    /// Per-stage concurrency limits
    #[serde(default)]
    pub concurrency: StageConcurrency,

    /// Retry behavior for every model call
    #[serde(default)]
    pub retry: RetrySettings,

    /// Persistent translation cache
    #[serde(default)]
    pub cache: CacheSettings,

    /// Initial evaluation score at or above which optimization is skipped
    #[serde(default = "default_optimization_threshold")]
    pub optimization_threshold: f32,

    /// Target-language-specific number formatting instructions
    #[serde(default = "default_number_format_rules")]
    pub number_format_rules: Vec<NumberFormatRule>,

    /// Optional glossary file (markdown table, `src -> tgt` or tab-separated lines)
    #[serde(default)]
    pub glossary_path: Option<String>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Language model provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    // @provider: OpenAI or any OpenAI-compatible server
    #[default]
    OpenAI,
    // @provider: Azure OpenAI deployment
    Azure,
    // @provider: Anthropic
    Anthropic,
    // @provider: Offline mock
    Mock,
}

impl ProviderKind {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Azure => "Azure OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Mock => "Mock",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Azure => "azure".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Mock => "mock".to_string(),
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Azure => Some("AZURE_OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Mock => None,
        }
    }

    /// Environment variable holding the endpoint
    pub fn endpoint_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_BASE_URL"),
            Self::Azure => Some("AZURE_OPENAI_ENDPOINT"),
            Self::Anthropic | Self::Mock => None,
        }
    }

    /// Whether requests leave the machine and need credentials
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::Mock)
    }
}

// Implement Display trait for ProviderKind
impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for ProviderKind
impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "azure" => Ok(Self::Azure),
            "anthropic" => Ok(Self::Anthropic),
            "mock" => Ok(Self::Mock),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Settings of one model role
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelConfig {
    // @field: Provider type identifier
    #[serde(default)]
    pub provider: ProviderKind,

    // @field: Model name (deployment name for Azure)
    #[serde(default = "default_model")]
    pub model: String,

    // @field: API key, falls back to the provider's environment variable
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL, falls back to the provider's environment variable
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Azure REST API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl ModelConfig {
    // @param provider: Provider enum
    // @param model: Model name
    // @returns: Model config with defaults
    pub fn new(provider: ProviderKind, model: &str) -> Self {
        Self {
            provider,
            model: model.to_string(),
            api_key: String::new(),
            endpoint: String::new(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }

    /// Offline mock model reporting `name`
    pub fn mock(name: &str) -> Self {
        Self::new(ProviderKind::Mock, name)
    }

    fn default_translator() -> Self {
        Self::new(ProviderKind::OpenAI, &default_model())
    }

    fn default_evaluator() -> Self {
        Self::new(ProviderKind::OpenAI, &default_model())
    }

    fn default_optimizer() -> Self {
        Self::new(ProviderKind::OpenAI, &default_model())
    }

    /// API key from the config, else from the provider's environment variable
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.is_empty() {
            return Some(self.api_key.clone());
        }
        self.provider
            .api_key_env()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty())
    }

    /// Endpoint from the config, else from the provider's environment variable.
    ///
    /// Empty means the provider's public default.
    pub fn resolved_endpoint(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.clone();
        }
        self.provider
            .endpoint_env()
            .and_then(|var| std::env::var(var).ok())
            .unwrap_or_default()
    }
}

/// Number of tasks each workflow stage keeps in flight
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct StageConcurrency {
    #[serde(default = "default_stage_concurrency")]
    pub translation: usize,
    #[serde(default = "default_stage_concurrency")]
    pub evaluation_1: usize,
    #[serde(default = "default_stage_concurrency")]
    pub optimization: usize,
    #[serde(default = "default_stage_concurrency")]
    pub evaluation_2: usize,
}

impl StageConcurrency {
    /// Same limit for every stage
    pub fn uniform(limit: usize) -> Self {
        Self {
            translation: limit,
            evaluation_1: limit,
            optimization: limit,
            evaluation_2: limit,
        }
    }
}

impl Default for StageConcurrency {
    fn default() -> Self {
        Self::uniform(default_stage_concurrency())
    }
}

/// Retry count and fixed delay for failed model calls
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    /// Total attempts per call, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Persistent translation cache settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON file the cache is loaded from and flushed to
    #[serde(default = "default_cache_path")]
    pub path: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_cache_path(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("Invalid log level: {}", s)),
        }
    }
}

fn default_source_language() -> String {
    "auto".to_string()
}

fn default_target_language() -> String {
    "Chinese".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_api_version() -> String {
    crate::providers::openai::DEFAULT_AZURE_API_VERSION.to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.3
}

fn default_stage_concurrency() -> usize {
    32
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_cache_path() -> String {
    "translation_cache.json".to_string()
}

fn default_optimization_threshold() -> f32 {
    9.5
}

fn default_number_format_rules() -> Vec<NumberFormatRule> {
    vec![NumberFormatRule::russian()]
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language must not be empty"));
        }
        if self.source_language.trim().is_empty() {
            return Err(anyhow!("Source language must not be empty (use \"auto\" to detect)"));
        }

        let stages = [
            ("translation", self.concurrency.translation),
            ("evaluation_1", self.concurrency.evaluation_1),
            ("optimization", self.concurrency.optimization),
            ("evaluation_2", self.concurrency.evaluation_2),
        ];
        for (stage, limit) in stages {
            if limit == 0 {
                return Err(anyhow!("Concurrency for stage '{}' must be at least 1", stage));
            }
        }

        if self.retry.max_attempts == 0 {
            return Err(anyhow!("Retry max_attempts must be at least 1"));
        }

        if !(0.0..=10.0).contains(&self.optimization_threshold) {
            return Err(anyhow!("Optimization threshold must be between 0 and 10"));
        }

        // Validate API key for every remote role
        for (role, model) in self.roles() {
            if model.model.trim().is_empty() {
                return Err(anyhow!("Model name is required for the {} role", role));
            }
            if model.provider.is_remote() && model.resolved_api_key().is_none() {
                return Err(anyhow!(
                    "API key is required for the {} role ({} provider)",
                    role,
                    model.provider.display_name()
                ));
            }
        }

        Ok(())
    }

    /// Role name and model settings, in A/B/C order
    pub fn roles(&self) -> [(&'static str, &ModelConfig); 3] {
        [
            ("translation", &self.translation),
            ("evaluation", &self.evaluation),
            ("optimization", &self.optimization),
        ]
    }

    /// Retry policy shared by all model calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.max_attempts, Duration::from_millis(self.retry.delay_ms))
    }

    /// Configuration using the offline mock for every role
    pub fn offline() -> Self {
        Self {
            translation: ModelConfig::mock("mock-translator"),
            evaluation: ModelConfig::mock("mock-evaluator"),
            optimization: ModelConfig::mock("mock-optimizer"),
            ..Self::default()
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: ModelConfig::default_translator(),
            evaluation: ModelConfig::default_evaluator(),
            optimization: ModelConfig::default_optimizer(),
            concurrency: StageConcurrency::default(),
            retry: RetrySettings::default(),
            cache: CacheSettings::default(),
            optimization_threshold: default_optimization_threshold(),
            number_format_rules: default_number_format_rules(),
            glossary_path: None,
            log_level: LogLevel::default(),
        }
    }
}
