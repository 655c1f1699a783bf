//! LLM provider trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Result;

/// Configuration for text generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model_id: String,
    pub max_new_tokens: u32,
    pub temperature: Option<f32>,
    pub do_sample: bool,
    pub stop_sequences: Vec<String>,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: "tiiuae/falcon-7b-instruct".to_string(),
            max_new_tokens: 256,
            temperature: Some(0.3),
            do_sample: false,
            stop_sequences: vec!["\nQuestion:".to_string()],
            timeout: Duration::from_secs(60),
        }
    }
}

/// Result of a text generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub model_id: String,
}

/// Callback receiving generated fragments as they arrive.
pub type TokenSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Trait for generative model backends.
///
/// Implementations may be remote and slow; callers treat latency and failure
/// modes as opaque.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate text with the provider's default configuration
    async fn generate(&self, prompt: &str) -> Result<GenerationResult>;

    /// Generate text with custom configuration
    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult>;

    /// Generate text, handing each fragment to `on_token` as it is produced.
    ///
    /// The default implementation emits the whole completion as one fragment.
    async fn generate_stream(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        on_token: TokenSink<'_>,
    ) -> Result<GenerationResult> {
        let result = self.generate_with_config(prompt, config).await?;
        on_token(&result.text);
        Ok(result)
    }

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}

/// Remove a leading copy of `prompt` from `output`.
///
/// Some text-generation backends return prompt and completion concatenated.
pub fn strip_prompt_echo(prompt: &str, output: &str) -> String {
    output
        .strip_prefix(prompt)
        .unwrap_or(output)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_prompt_echo() {
        let prompt = "Question:\nWhat is the capital of France?\nAnswer:";
        let output = format!("{} Paris.", prompt);
        assert_eq!(strip_prompt_echo(prompt, &output), "Paris.");
    }

    #[test]
    fn test_strip_prompt_echo_leaves_completion_only_output() {
        assert_eq!(strip_prompt_echo("Question: x", "  Paris.\n"), "Paris.");
    }
}
