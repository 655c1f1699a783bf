//! Hugging Face Inference API configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use ragchat_core::{Error, GenerationConfig, Result};

pub const DEFAULT_API_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_GENERATION_MODEL: &str = "tiiuae/falcon-7b-instruct";

/// Configuration for the Hugging Face Inference API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    #[serde(skip_serializing, default)]
    pub api_token: Option<String>,
    pub api_url: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl HuggingFaceConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// A missing token is not an error here; remote calls refuse to run later.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_token = lookup("HUGGINGFACEHUB_API_TOKEN")
            .or_else(|| lookup("HF_TOKEN"))
            .filter(|token| !token.trim().is_empty());

        let api_url = lookup("HF_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let embedding_model =
            lookup("HF_EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        let generation_model =
            lookup("HF_GENERATION_MODEL").unwrap_or_else(|| DEFAULT_GENERATION_MODEL.to_string());

        let max_new_tokens = parse_or(&lookup, "HF_MAX_NEW_TOKENS", 256)?;
        let temperature = parse_or(&lookup, "HF_TEMPERATURE", 0.3)?;
        let timeout_secs = parse_or(&lookup, "HF_TIMEOUT_SECS", 60)?;

        Ok(Self {
            api_token,
            api_url,
            embedding_model,
            generation_model,
            max_new_tokens,
            temperature,
            timeout_secs,
        })
    }

    /// Create configuration with explicit values
    pub fn new(api_token: Option<String>) -> Self {
        Self {
            api_token,
            api_url: DEFAULT_API_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            max_new_tokens: 256,
            temperature: 0.3,
            timeout_secs: 60,
        }
    }

    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Generation settings derived from this configuration
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model_id: self.generation_model.clone(),
            max_new_tokens: self.max_new_tokens,
            temperature: Some(self.temperature),
            timeout: self.timeout(),
            ..Default::default()
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Configuration(format!("{} has invalid value '{}'", key, raw))),
        None => Ok(default),
    }
}
