//! Client for the opaque image-to-text (OCR) provider, feeding the
//! prescription-scanning product search.
//!
//! The provider contract: POST a JSON body `{"image": "<base64>"}` with a
//! bearer key, receive `{"text": "..."}` back. Everything else about it is
//! out of scope.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::OcrConfig;

/// Shortest keyword worth searching the catalog for.
const MIN_KEYWORD_LENGTH: usize = 3;

/// Cap on keywords per scan; OCR noise on a dense label can produce
/// hundreds of tokens.
const MAX_KEYWORDS: usize = 32;

/// Errors from the OCR integration.
#[derive(Debug, Error)]
pub enum OcrError {
    /// No provider configured.
    #[error("OCR provider is not configured")]
    NotConfigured,

    /// The HTTP request failed.
    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("OCR provider returned {0}")]
    Status(StatusCode),
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    text: String,
}

/// Client for the image-to-text provider.
#[derive(Clone)]
pub struct OcrClient {
    http: reqwest::Client,
    config: OcrConfig,
}

impl OcrClient {
    /// Create a new OCR client.
    #[must_use]
    pub fn new(config: OcrConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Extract text from an image.
    ///
    /// # Errors
    ///
    /// Returns `OcrError::Http`/`OcrError::Status` when the provider is
    /// unreachable or unhappy.
    pub async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let response = self
            .http
            .post(&self.config.url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&json!({ "image": BASE64.encode(image) }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OcrError::Status(response.status()));
        }

        let body: OcrResponse = response.json().await?;
        Ok(body.text)
    }
}

/// Split OCR text into search keywords: alphanumeric runs of at least three
/// characters, lowercased, deduplicated, order-preserving, capped.
#[must_use]
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut keywords = Vec::new();

    for token in text.split(|c: char| !c.is_alphanumeric()) {
        if token.len() < MIN_KEYWORD_LENGTH {
            continue;
        }
        let keyword = token.to_lowercase();
        if seen.insert(keyword.clone()) {
            keywords.push(keyword);
            if keywords.len() >= MAX_KEYWORDS {
                break;
            }
        }
    }

    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_keywords_splits_and_lowercases() {
        let keywords = extract_keywords("Rx: Amoxicillin 500mg, twice daily");
        assert_eq!(
            keywords,
            vec!["amoxicillin", "500mg", "twice", "daily"]
        );
    }

    #[test]
    fn test_extract_keywords_drops_short_tokens_and_duplicates() {
        let keywords = extract_keywords("mg mg Ibuprofen IBUPROFEN at 9 am");
        assert_eq!(keywords, vec!["ibuprofen"]);
    }

    #[test]
    fn test_extract_keywords_empty_text() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("- . , !").is_empty());
    }

    #[test]
    fn test_extract_keywords_is_capped() {
        let text = (0..100)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(extract_keywords(&text).len(), MAX_KEYWORDS);
    }
}
