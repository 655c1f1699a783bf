//! Hugging Face Inference API client implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use ragchat_core::{
    EmbeddingProvider, Error, GenerationConfig, GenerationResult, LLMProvider, Result, TokenSink,
    strip_prompt_echo,
};

use crate::config::HuggingFaceConfig;
use crate::response::{
    check_status, parse_embeddings, parse_generation, parse_stream_line, status_error,
};

/// Texts sent per feature-extraction request
const EMBEDDING_BATCH_SIZE: usize = 32;

/// Client for the hosted text-generation and feature-extraction endpoints
#[derive(Clone)]
pub struct HuggingFaceClient {
    config: HuggingFaceConfig,
    client: Client,
}

#[derive(Serialize)]
struct GenerationParams {
    max_new_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    do_sample: bool,
    return_full_text: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParams,
    options: RequestOptions,
    stream: bool,
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
    options: RequestOptions,
}

impl HuggingFaceClient {
    /// Create a new client from configuration
    pub fn new(config: HuggingFaceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1) * 2))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = HuggingFaceConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &HuggingFaceConfig {
        &self.config
    }

    /// Embedding provider backed by this client's feature-extraction model
    pub fn embeddings(&self) -> HuggingFaceEmbeddings {
        HuggingFaceEmbeddings::new(self.clone())
    }

    fn token(&self) -> Result<&str> {
        self.config.api_token.as_deref().ok_or_else(|| {
            Error::MissingCredentials("no Hugging Face API token configured".to_string())
        })
    }

    fn generation_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.config.api_url, model)
    }

    fn feature_extraction_url(&self) -> String {
        format!(
            "{}/pipeline/feature-extraction/{}",
            self.config.api_url, self.config.embedding_model
        )
    }

    fn generation_request<'a>(
        prompt: &'a str,
        config: &GenerationConfig,
        stream: bool,
    ) -> GenerationRequest<'a> {
        GenerationRequest {
            inputs: prompt,
            parameters: GenerationParams {
                max_new_tokens: config.max_new_tokens,
                temperature: config.temperature.filter(|t| *t > 0.0),
                do_sample: config.do_sample,
                return_full_text: false,
                stop: config.stop_sequences.clone(),
            },
            options: RequestOptions {
                wait_for_model: true,
            },
            stream,
        }
    }

    /// POST a JSON body and return the status and raw body text
    async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<(u16, String)> {
        let token = self.token()?;

        let response = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok((status, text))
    }

    /// Perform the actual generation request
    async fn perform_generation(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let request = Self::generation_request(prompt, config, false);
        let url = self.generation_url(&config.model_id);

        let (status, body) = self.post_json(&url, &request).await?;
        if let Err(e) = check_status(status, &body) {
            warn!(model = %config.model_id, status, "text generation request failed");
            return Err(e);
        }

        parse_generation(&body)
    }

    /// Stream tokens from the server-sent event response
    async fn perform_stream(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        on_token: TokenSink<'_>,
    ) -> Result<String> {
        let token = self.token()?;
        let request = Self::generation_request(prompt, config, true);
        let url = self.generation_url(&config.model_id);

        let response = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(model = %config.model_id, status, "streaming generation request failed");
            return Err(status_error(status, &body));
        }

        let mut stream = response.bytes_stream();
        let mut pending: Vec<u8> = Vec::new();
        let mut filter = StopFilter::new(&config.stop_sequences);
        let mut final_text: Option<String> = None;

        while let Some(bytes) = stream.next().await {
            let bytes = bytes.map_err(|e| Error::Network(e.to_string()))?;
            pending.extend_from_slice(&bytes);

            while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = pending.drain(..=pos).collect();
                apply_stream_line(&line, on_token, &mut filter, &mut final_text)?;
            }
        }

        if !pending.is_empty() {
            apply_stream_line(&pending, on_token, &mut filter, &mut final_text)?;
        }
        filter.flush(on_token);

        Ok(final_text.unwrap_or_else(|| filter.into_received()))
    }

    fn finish(&self, prompt: &str, raw: String, config: &GenerationConfig) -> Result<GenerationResult> {
        let text = clean_completion(prompt, &raw, &config.stop_sequences);
        if text.is_empty() {
            return Err(Error::RemoteApi {
                status: None,
                message: format!("empty completion from {}", config.model_id),
            });
        }
        debug!(model = %config.model_id, chars = text.len(), "generation complete");

        Ok(GenerationResult {
            text,
            model_id: config.model_id.clone(),
        })
    }
}

/// Forwards streamed tokens up to the first stop sequence.
///
/// The tail that could still turn into a stop sequence is held back until
/// more text arrives, so the caller only ever sees what `clean_completion`
/// will keep.
struct StopFilter {
    stops: Vec<String>,
    holdback: usize,
    received: String,
    emitted: usize,
    stopped: bool,
}

impl StopFilter {
    fn new(stop_sequences: &[String]) -> Self {
        let stops: Vec<String> = stop_sequences
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect();
        let holdback = stops
            .iter()
            .map(|s| s.len())
            .max()
            .unwrap_or(0)
            .saturating_sub(1);

        Self {
            stops,
            holdback,
            received: String::new(),
            emitted: 0,
            stopped: false,
        }
    }

    fn push(&mut self, token: &str, on_token: TokenSink<'_>) {
        self.received.push_str(token);
        if self.stopped {
            return;
        }

        let unsent = &self.received[self.emitted..];
        let stop_at = self
            .stops
            .iter()
            .filter_map(|stop| unsent.find(stop.as_str()))
            .min()
            .map(|pos| self.emitted + pos);

        let end = match stop_at {
            Some(pos) => {
                self.stopped = true;
                pos
            }
            None => {
                let mut end = self
                    .received
                    .len()
                    .saturating_sub(self.holdback)
                    .max(self.emitted);
                while !self.received.is_char_boundary(end) {
                    end -= 1;
                }
                end
            }
        };
        self.emit(end, on_token);
    }

    /// Release the held-back tail once the stream has ended.
    fn flush(&mut self, on_token: TokenSink<'_>) {
        if !self.stopped {
            self.emit(self.received.len(), on_token);
        }
    }

    fn emit(&mut self, end: usize, on_token: TokenSink<'_>) {
        if end > self.emitted {
            on_token(&self.received[self.emitted..end]);
            self.emitted = end;
        }
    }

    fn into_received(self) -> String {
        self.received
    }
}

fn apply_stream_line(
    line: &[u8],
    on_token: TokenSink<'_>,
    filter: &mut StopFilter,
    final_text: &mut Option<String>,
) -> Result<()> {
    let line = String::from_utf8_lossy(line);
    if let Some(event) = parse_stream_line(line.trim_end())? {
        if let Some(text) = event.token {
            filter.push(&text, on_token);
        }
        if event.generated_text.is_some() {
            *final_text = event.generated_text;
        }
    }
    Ok(())
}

/// Strip an echoed prompt and anything after the first stop sequence.
fn clean_completion(prompt: &str, raw: &str, stop_sequences: &[String]) -> String {
    let mut text = strip_prompt_echo(prompt, raw);
    for stop in stop_sequences {
        if let Some(pos) = text.find(stop.as_str()) {
            text.truncate(pos);
        }
    }
    text.trim().to_string()
}

#[async_trait]
impl LLMProvider for HuggingFaceClient {
    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        let config = self.config.generation_config();
        self.generate_with_config(prompt, &config).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let generation_future = self.perform_generation(prompt, config);

        let raw = match timeout(config.timeout, generation_future).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout("Request timed out".to_string())),
        };

        self.finish(prompt, raw, config)
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        config: &GenerationConfig,
        on_token: TokenSink<'_>,
    ) -> Result<GenerationResult> {
        let stream_future = self.perform_stream(prompt, config, on_token);

        let raw = match timeout(config.timeout, stream_future).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout("Streaming request timed out".to_string())),
        };

        self.finish(prompt, raw, config)
    }

    fn model_id(&self) -> &str {
        &self.config.generation_model
    }
}

/// Remote sentence-embedding provider
#[derive(Clone)]
pub struct HuggingFaceEmbeddings {
    client: HuggingFaceClient,
}

impl HuggingFaceEmbeddings {
    pub fn new(client: HuggingFaceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::EmbeddingFailure("no embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(EMBEDDING_BATCH_SIZE) {
            let request = FeatureExtractionRequest {
                inputs: batch,
                options: RequestOptions {
                    wait_for_model: true,
                },
            };
            let url = self.client.feature_extraction_url();

            let request_future = self.client.post_json(&url, &request);
            let (status, body) = match timeout(self.client.config.timeout(), request_future).await {
                Ok(result) => result?,
                Err(_) => return Err(Error::Timeout("Embedding request timed out".to_string())),
            };

            if let Err(e) = check_status(status, &body) {
                warn!(model = %self.client.config.embedding_model, status, "feature extraction request failed");
                return Err(e);
            }

            vectors.extend(parse_embeddings(&body, batch.len())?);
        }

        Ok(vectors)
    }

    fn model_id(&self) -> &str {
        &self.client.config.embedding_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_completion_strips_echo_and_stop() {
        let prompt = "Question:\nWhere?\nAnswer:";
        let raw = format!("{} Paris.\nQuestion: and then?", prompt);
        let stops = vec!["\nQuestion:".to_string()];
        assert_eq!(clean_completion(prompt, &raw, &stops), "Paris.");
    }

    fn token_line(text: &str) -> Vec<u8> {
        let event = serde_json::json!({ "token": { "text": text, "special": false } });
        format!("data: {}\n", event).into_bytes()
    }

    fn run_stream(tokens: &[&str], stops: &[String]) -> (String, String) {
        let mut shown = String::new();
        let mut sink = |token: &str| shown.push_str(token);
        let mut filter = StopFilter::new(stops);
        let mut final_text = None;
        for token in tokens {
            apply_stream_line(&token_line(token), &mut sink, &mut filter, &mut final_text).unwrap();
        }
        filter.flush(&mut sink);
        let received = final_text.unwrap_or_else(|| filter.into_received());
        (shown, received)
    }

    #[test]
    fn test_streamed_tokens_stop_where_answer_is_cut() {
        let stops = vec!["\nQuestion:".to_string()];
        let (shown, received) = run_stream(&[" Paris.", "\nQuestion: and Rome?"], &stops);

        assert_eq!(shown, " Paris.");
        assert_eq!(clean_completion("prompt", &received, &stops), "Paris.");
        assert_eq!(shown.trim(), clean_completion("prompt", &received, &stops));
    }

    #[test]
    fn test_partial_stop_sequence_is_held_back() {
        let stops = vec!["\nQuestion:".to_string()];
        let (shown, _) = run_stream(&[" Paris.", "\nQue", "stion: next"], &stops);
        assert_eq!(shown, " Paris.");

        // a near miss is released once it cannot become a stop sequence
        let (shown, _) = run_stream(&[" Paris.", "\nQue", "ue"], &stops);
        assert_eq!(shown, " Paris.\nQueue");
    }

    #[test]
    fn test_stream_without_stops_passes_everything() {
        let (shown, received) = run_stream(&["Hé", "llo", " wörld"], &[]);
        assert_eq!(shown, "Héllo wörld");
        assert_eq!(received, "Héllo wörld");
    }

    #[tokio::test]
    async fn test_missing_token_blocks_remote_calls() {
        let client = HuggingFaceClient::new(HuggingFaceConfig::new(None)).unwrap();

        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentials(_)));

        let err = client.embeddings().embed("hello").await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentials(_)));
    }

    #[test]
    fn test_generation_request_body() {
        let config = GenerationConfig::default();
        let request = HuggingFaceClient::generation_request("hi", &config, true);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["inputs"], "hi");
        assert_eq!(body["stream"], true);
        assert_eq!(body["parameters"]["return_full_text"], false);
        assert_eq!(body["parameters"]["max_new_tokens"], 256);
        assert_eq!(body["options"]["wait_for_model"], true);
    }
}
