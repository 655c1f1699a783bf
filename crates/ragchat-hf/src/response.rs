//! Decoding of Inference API response bodies.
//!
//! The API answers with a JSON list on success (`[{"generated_text": ..}]`
//! for generation, nested float arrays for feature extraction) and with a
//! JSON object carrying an `error` key when the model is loading, the token
//! is rejected, or the input is refused. Both shapes must be told apart.

use serde_json::Value;

use ragchat_core::{Error, Result};

const MAX_ERROR_BODY: usize = 500;

/// Reject non-2xx statuses, embedding the status code in the error.
pub fn check_status(status: u16, body: &str) -> Result<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    Err(status_error(status, body))
}

/// Error for a failed HTTP status, preferring the body's `error` message.
pub fn status_error(status: u16, body: &str) -> Error {
    Error::remote(status, error_detail(body))
}

/// Best human-readable explanation found in an error body
fn error_detail(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        if let Some(message) = map.get("error").and_then(error_text) {
            return message;
        }
    }
    trimmed.chars().take(MAX_ERROR_BODY).collect()
}

fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn decode(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Err(Error::RemoteApi {
            status: None,
            message: "empty response body".to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| Error::RemoteApi {
        status: None,
        message: format!("malformed response: {}", e),
    })
}

fn unexpected(what: &str) -> Error {
    Error::RemoteApi {
        status: None,
        message: format!("unexpected response shape: {}", what),
    }
}

/// A dict response with an `error` key is a failure even under status 200.
fn reject_error_object(value: &Value) -> Result<()> {
    if let Some(message) = value.as_object().and_then(|map| map.get("error")).and_then(error_text) {
        return Err(Error::RemoteApi {
            status: None,
            message,
        });
    }
    Ok(())
}

/// Extract `generated_text` from a text-generation response body.
pub fn parse_generation(body: &str) -> Result<String> {
    let value = decode(body)?;
    reject_error_object(&value)?;

    let generated = match &value {
        Value::Array(items) => items.first().and_then(|item| item.get("generated_text")),
        Value::Object(map) => map.get("generated_text"),
        _ => None,
    };

    generated
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| unexpected("no generated_text in response"))
}

/// Extract one vector per input from a feature-extraction response body.
pub fn parse_embeddings(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let value = decode(body)?;
    reject_error_object(&value)?;

    if !value.is_array() {
        return Err(unexpected("feature extraction did not return a list"));
    }

    let vectors: Vec<Vec<f32>> = match serde_json::from_value::<Vec<Vec<f32>>>(value.clone()) {
        Ok(vectors) => vectors,
        // A single input may come back as a flat vector
        Err(_) => match serde_json::from_value::<Vec<f32>>(value) {
            Ok(vector) if expected == 1 => vec![vector],
            _ => return Err(unexpected("feature extraction returned non-numeric data")),
        },
    };

    if vectors.len() != expected {
        return Err(unexpected(&format!(
            "expected {} embeddings, got {}",
            expected,
            vectors.len()
        )));
    }
    Ok(vectors)
}

/// One decoded server-sent event from a streaming generation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamEvent {
    pub token: Option<String>,
    pub generated_text: Option<String>,
}

/// Decode a single `data:` line of a streaming response.
///
/// Returns `Ok(None)` for comments, keep-alives and the terminal `[DONE]`.
pub fn parse_stream_line(line: &str) -> Result<Option<StreamEvent>> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let value = decode(data)?;
    reject_error_object(&value)?;

    let token = value.get("token").and_then(|token| {
        let special = token.get("special").and_then(Value::as_bool).unwrap_or(false);
        if special {
            None
        } else {
            token.get("text").and_then(Value::as_str).map(str::to_string)
        }
    });
    let generated_text = value
        .get("generated_text")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Some(StreamEvent {
        token,
        generated_text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_500_is_remote_error_with_code() {
        let err = check_status(500, "Internal Server Error").unwrap_err();
        match &err {
            Error::RemoteApi { status, message } => {
                assert_eq!(*status, Some(500));
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_status_error_prefers_error_key() {
        let err = check_status(503, r#"{"error":"Model is currently loading","estimated_time":20.0}"#)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Remote API error (status 503): Model is currently loading"
        );
    }

    #[test]
    fn test_status_error_with_empty_body() {
        let err = check_status(401, "   ").unwrap_err();
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("empty response body"));
    }

    #[test]
    fn test_success_status_passes() {
        assert!(check_status(200, "").is_ok());
    }

    #[test]
    fn test_parse_generation_list() {
        let text = parse_generation(r#"[{"generated_text":"Paris."}]"#).unwrap();
        assert_eq!(text, "Paris.");
    }

    #[test]
    fn test_parse_generation_error_dict() {
        let err = parse_generation(r#"{"error":"Input validation error"}"#).unwrap_err();
        match err {
            Error::RemoteApi { status, message } => {
                assert_eq!(status, None);
                assert_eq!(message, "Input validation error");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_generation_rejects_empty_and_malformed() {
        assert!(matches!(parse_generation(""), Err(Error::RemoteApi { .. })));

        let err = parse_generation("<html>bad gateway</html>").unwrap_err();
        assert!(err.to_string().contains("malformed response"));

        let err = parse_generation(r#"[{"summary_text":"x"}]"#).unwrap_err();
        assert!(err.to_string().contains("generated_text"));
    }

    #[test]
    fn test_parse_embeddings() {
        let vectors = parse_embeddings("[[0.1, 0.2], [0.3, 0.4]]", 2).unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);

        let single = parse_embeddings("[0.5, 0.25]", 1).unwrap();
        assert_eq!(single, vec![vec![0.5, 0.25]]);
    }

    #[test]
    fn test_parse_embeddings_count_mismatch() {
        let err = parse_embeddings("[[0.1, 0.2]]", 3).unwrap_err();
        assert!(err.to_string().contains("expected 3 embeddings, got 1"));
    }

    #[test]
    fn test_parse_embeddings_error_dict() {
        let err = parse_embeddings(r#"{"error":["Authorization header is invalid"]}"#, 1).unwrap_err();
        assert!(err.to_string().contains("Authorization header is invalid"));
    }

    #[test]
    fn test_parse_stream_lines() {
        let event = parse_stream_line(
            r#"data:{"token":{"id":1,"text":" Paris","logprob":-0.1,"special":false},"generated_text":null,"details":null}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(event.token.as_deref(), Some(" Paris"));
        assert_eq!(event.generated_text, None);

        let last = parse_stream_line(
            r#"data: {"token":{"id":2,"text":"</s>","logprob":0.0,"special":true},"generated_text":" Paris"}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(last.token, None);
        assert_eq!(last.generated_text.as_deref(), Some(" Paris"));

        assert_eq!(parse_stream_line(": keep-alive").unwrap(), None);
        assert_eq!(parse_stream_line("data: [DONE]").unwrap(), None);
        assert!(parse_stream_line(r#"data:{"error":"overloaded","error_type":"overloaded"}"#).is_err());
    }
}
