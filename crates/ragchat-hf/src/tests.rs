//! Snapshot tests for the Hugging Face client configuration

#[cfg(test)]
mod snapshot_tests {
    use crate::{HuggingFaceClient, HuggingFaceConfig, LLMProvider, EmbeddingProvider, Error};
    use insta::assert_snapshot;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_snapshot_hides_token() {
        let config = HuggingFaceConfig::from_lookup(lookup_from(&[
            ("HUGGINGFACEHUB_API_TOKEN", "hf_secret_redacted"),
        ]))
        .unwrap();
        assert!(config.has_token());

        let rendered = serde_json::to_string_pretty(&config).unwrap();
        assert!(!rendered.contains("hf_secret_redacted"));

        assert_snapshot!(rendered, @r###"
        {
          "api_url": "https://api-inference.huggingface.co",
          "embedding_model": "sentence-transformers/all-MiniLM-L6-v2",
          "generation_model": "tiiuae/falcon-7b-instruct",
          "max_new_tokens": 256,
          "temperature": 0.3,
          "timeout_secs": 60
        }
        "###);
    }

    #[test]
    fn test_config_overrides_and_fallback_token() {
        let config = HuggingFaceConfig::from_lookup(lookup_from(&[
            ("HF_TOKEN", "hf_fallback"),
            ("HF_API_URL", "http://localhost:8080/"),
            ("HF_GENERATION_MODEL", "tiiuae/falcon-rw-1b"),
            ("HF_MAX_NEW_TOKENS", "64"),
        ]))
        .unwrap();

        assert_eq!(config.api_token.as_deref(), Some("hf_fallback"));
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.generation_model, "tiiuae/falcon-rw-1b");
        assert_eq!(config.generation_config().max_new_tokens, 64);
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let config =
            HuggingFaceConfig::from_lookup(lookup_from(&[("HUGGINGFACEHUB_API_TOKEN", "  ")]))
                .unwrap();
        assert!(!config.has_token());
    }

    #[test]
    fn test_invalid_number_is_configuration_error() {
        let err = HuggingFaceConfig::from_lookup(lookup_from(&[("HF_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_model_ids() {
        let client = HuggingFaceClient::new(HuggingFaceConfig::new(None)).unwrap();
        assert_eq!(client.model_id(), "tiiuae/falcon-7b-instruct");
        assert_eq!(
            client.embeddings().model_id(),
            "sentence-transformers/all-MiniLM-L6-v2"
        );
    }
}
