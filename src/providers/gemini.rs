//! Gemini provider implementation for Vegapunk
//!
//! This module implements the Provider trait over the Gemini
//! `generateContent` REST endpoint, covering both plain text prompts and
//! multimodal prompts carrying inline base64 image data.

use crate::config::GeminiConfig;
use crate::error::{Result, VegapunkError};
use crate::imaging::EncodedImage;
use crate::providers::Provider;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini API provider
///
/// Connects to the Gemini REST API (or a mock pointed at via
/// `GeminiConfig::api_base`) to generate text from prompts and images.
///
/// # Examples
///
/// ```no_run
/// use vegapunk::config::GeminiConfig;
/// use vegapunk::providers::{GeminiProvider, Provider};
///
/// # async fn example() -> vegapunk::error::Result<()> {
/// let config = GeminiConfig {
///     api_base: None,
///     model: "gemini-1.5-flash".to_string(),
///     api_key: Some("secret".to_string()),
/// };
/// let provider = GeminiProvider::new(config)?;
/// let reply = provider.generate_text("Hello!").await?;
/// # Ok(())
/// # }
/// ```
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
    api_base: String,
    api_key: String,
}

/// Request body for generateContent
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

/// One content entry in the request
#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

/// A request part: either text or inline image data
#[derive(Debug, Serialize)]
struct RequestPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl RequestPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline_image(image: &EncodedImage) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            }),
        }
    }
}

/// Inline binary payload (base64) with its MIME type
#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

/// Response body from generateContent
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// One generation candidate
#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

/// Content of a candidate
#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

/// A response part; only text parts are consumed
#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini API error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    status: String,
    message: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider instance
    ///
    /// # Arguments
    ///
    /// * `config` - Gemini configuration; the API key must be present
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or HTTP client
    /// initialization fails
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| VegapunkError::MissingCredentials("gemini".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent("vegapunk/0.1.0")
            .build()
            .map_err(|e| VegapunkError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        tracing::info!(
            "Initialized Gemini provider: base={}, model={}",
            api_base,
            config.model
        );

        Ok(Self {
            client,
            config,
            api_base,
            api_key,
        })
    }

    /// Send a generateContent request and extract its text
    async fn generate(&self, parts: Vec<RequestPart>) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.config.model
        );

        let body = GenerateContentRequest {
            contents: vec![RequestContent { parts }],
        };

        tracing::debug!(model = %self.config.model, "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gemini request failed: {}", e);
                VegapunkError::Provider(format!("Gemini request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                tracing::error!(
                    "Gemini API error ({}): {}",
                    error_response.error.status,
                    error_response.error.message
                );
                return Err(VegapunkError::Provider(format!(
                    "Gemini API error ({}): {}",
                    error_response.error.status, error_response.error.message
                ))
                .into());
            }

            tracing::error!("Gemini returned error {}: {}", status, error_text);
            return Err(VegapunkError::Provider(format!(
                "Gemini returned {}: {}",
                status, error_text
            ))
            .into());
        }

        let api_response: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            VegapunkError::Provider(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = api_response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.clone())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(
                VegapunkError::Provider("Gemini response contained no text".to_string()).into(),
            );
        }

        Ok(text)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.generate(vec![RequestPart::text(prompt)]).await
    }

    async fn generate_vision(&self, image: &EncodedImage, prompt: &str) -> Result<String> {
        // Image part first, prompt second, matching the API examples.
        self.generate(vec![
            RequestPart::inline_image(image),
            RequestPart::text(prompt),
        ])
        .await
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> GeminiConfig {
        GeminiConfig {
            api_base: Some("http://localhost:9999".to_string()),
            model: "gemini-1.5-flash".to_string(),
            api_key: Some("test-key".to_string()),
        }
    }

    #[test]
    fn test_provider_creation() {
        let provider = GeminiProvider::new(test_config());
        assert!(provider.is_ok());
    }

    #[test]
    fn test_provider_requires_api_key() {
        let config = GeminiConfig {
            api_key: None,
            ..test_config()
        };
        let result = GeminiProvider::new(config);
        assert!(result.is_err());
    }

    #[test]
    fn test_provider_model() {
        let provider = GeminiProvider::new(test_config()).unwrap();
        assert_eq!(provider.model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_text_part_serialization() {
        let part = RequestPart::text("Hello");
        let json = serde_json::to_string(&part).unwrap();
        assert_eq!(json, r#"{"text":"Hello"}"#);
    }

    #[test]
    fn test_inline_image_part_serialization() {
        let image = EncodedImage {
            mime_type: "image/png".to_string(),
            data: "aGVsbG8=".to_string(),
        };
        let part = RequestPart::inline_image(&image);
        let json = serde_json::to_string(&part).unwrap();
        assert_eq!(
            json,
            r#"{"inline_data":{"mime_type":"image/png","data":"aGVsbG8="}}"#
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart::text("What do you see?")],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "What do you see?");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"text": "Greetings "}, {"text": "from the lab."}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let text: String = response.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .filter_map(|p| p.text.clone())
            .collect();
        assert_eq!(text, "Greetings from the lab.");
    }

    #[test]
    fn test_response_parsing_empty_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(response.candidates.is_empty());
    }

    #[test]
    fn test_error_response_parsing() {
        let json = r#"{
            "error": {
                "code": 400,
                "message": "API key not valid",
                "status": "INVALID_ARGUMENT"
            }
        }"#;

        let error: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(error.error.status, "INVALID_ARGUMENT");
        assert_eq!(error.error.message, "API key not valid");
    }
}
