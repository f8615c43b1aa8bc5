//! Base provider trait for Vegapunk
//!
//! This module defines the Provider trait that generative AI backends
//! implement: one text-generation operation and one multimodal operation
//! taking an encoded image alongside the prompt.

use crate::error::Result;
use crate::imaging::EncodedImage;
use async_trait::async_trait;

/// Provider trait for generative AI backends
///
/// Both operations return the generated text verbatim; failures propagate as
/// errors and are converted into apologies by the dispatcher, never here.
///
/// # Examples
///
/// ```no_run
/// use vegapunk::providers::Provider;
/// use vegapunk::imaging::EncodedImage;
/// use vegapunk::error::Result;
/// use async_trait::async_trait;
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl Provider for MyProvider {
///     async fn generate_text(&self, _prompt: &str) -> Result<String> {
///         Ok("generated".to_string())
///     }
///
///     async fn generate_vision(&self, _image: &EncodedImage, _prompt: &str) -> Result<String> {
///         Ok("described".to_string())
///     }
///
///     fn model(&self) -> String {
///         "my-model".to_string()
///     }
/// }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate text from a prompt
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the response is invalid
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    /// Generate text from an encoded image plus a prompt
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the response is invalid
    async fn generate_vision(&self, image: &EncodedImage, prompt: &str) -> Result<String>;

    /// Name of the model this provider generates with
    fn model(&self) -> String;
}
