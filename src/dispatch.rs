//! Request dispatchers for Vegapunk
//!
//! This module forwards user input to the generative AI provider and
//! normalizes both results and failures into [`ChatReply`] values. A failed
//! outbound call never aborts the conversation: the reply carries a fixed
//! apology string plus a warning for the presentation layer to display.

use crate::imaging;
use crate::providers::Provider;

/// Substring that short-circuits the text dispatcher with the persona reply
pub const PERSONA_TRIGGER: &str = "who are you";

/// Canned self-introduction returned for the trigger phrase
pub const PERSONA_REPLY: &str = "I am Dr. Vegapunk, the world's greatest scientist! \
My research spans across countless fields, from artificial Devil Fruits to revolutionary \
scientific breakthroughs that push the boundaries of what's possible. You've likely heard \
of my work with the Pacifistas and the Seraphim projects. How can I assist you in your journey?";

/// Apology returned when a text generation call fails
pub const TEXT_APOLOGY: &str = "I'm sorry, but I'm having trouble responding right now.";

/// Apology returned when an image analysis call fails
pub const IMAGE_APOLOGY: &str = "Sorry, I couldn't analyze the image.";

/// Prompt used when an image is submitted without text
pub const DEFAULT_IMAGE_PROMPT: &str = "What do you see in this image?";

/// Outcome of a dispatch: reply text plus an optional warning
///
/// The warning, when present, describes why the reply is an apology; the
/// presentation layer decides how to show it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Text to append to the conversation as the assistant message
    pub text: String,
    /// Cause of a degraded reply, for display as a transient notice
    pub warning: Option<String>,
}

impl ChatReply {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            warning: None,
        }
    }

    fn degraded(text: impl Into<String>, warning: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            warning: Some(warning.into()),
        }
    }
}

/// Dispatches chat submissions to the configured provider
///
/// Holds the provider as an option: when the API credential is missing the
/// application still serves the page, and every dispatch degrades into an
/// apology with a configuration warning.
pub struct ChatDispatcher {
    provider: Option<Box<dyn Provider>>,
}

impl ChatDispatcher {
    /// Creates a dispatcher around an optional provider
    pub fn new(provider: Option<Box<dyn Provider>>) -> Self {
        Self { provider }
    }

    /// True when a provider is configured and dispatches can succeed
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Respond to a text prompt
    ///
    /// If the lower-cased prompt contains [`PERSONA_TRIGGER`], the fixed
    /// persona reply is returned without any external call. Otherwise the
    /// prompt is forwarded to the provider; failures degrade into
    /// [`TEXT_APOLOGY`] plus a warning.
    pub async fn respond_text(&self, prompt: &str) -> ChatReply {
        if prompt.to_lowercase().contains(PERSONA_TRIGGER) {
            tracing::debug!("Persona trigger matched, skipping provider call");
            return ChatReply::ok(PERSONA_REPLY);
        }

        let Some(provider) = &self.provider else {
            return ChatReply::degraded(TEXT_APOLOGY, "API key not configured");
        };

        match provider.generate_text(prompt).await {
            Ok(text) => ChatReply::ok(text),
            Err(e) => {
                tracing::warn!("AI request failed: {:#}", e);
                ChatReply::degraded(TEXT_APOLOGY, format!("API request failed: {}", e))
            }
        }
    }

    /// Respond to an uploaded image with an optional prompt
    ///
    /// A blank prompt defaults to [`DEFAULT_IMAGE_PROMPT`]. Encoding
    /// failures and provider failures both degrade into [`IMAGE_APOLOGY`]
    /// plus a warning.
    pub async fn respond_image(&self, image_bytes: &[u8], prompt: &str) -> ChatReply {
        let prompt = if prompt.trim().is_empty() {
            DEFAULT_IMAGE_PROMPT
        } else {
            prompt
        };

        let Some(provider) = &self.provider else {
            return ChatReply::degraded(IMAGE_APOLOGY, "API key not configured");
        };

        let encoded = match imaging::encode_image(image_bytes) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!("Image encoding failed: {:#}", e);
                return ChatReply::degraded(IMAGE_APOLOGY, format!("Image analysis failed: {}", e));
            }
        };

        match provider.generate_vision(&encoded, prompt).await {
            Ok(text) => ChatReply::ok(text),
            Err(e) => {
                tracing::warn!("Image analysis failed: {:#}", e);
                ChatReply::degraded(IMAGE_APOLOGY, format!("Image analysis failed: {}", e))
            }
        }
    }
}
