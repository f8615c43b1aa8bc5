//! Provider module for Vegapunk
//!
//! This module contains the generative AI provider abstraction and the
//! Gemini implementation.

pub mod base;
pub mod gemini;

pub use base::Provider;
pub use gemini::GeminiProvider;

use crate::config::ProviderConfig;
use crate::error::Result;

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `config` - Provider configuration
///
/// # Returns
///
/// Returns a boxed provider instance
///
/// # Errors
///
/// Returns error if the provider type is unknown or initialization fails
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match config.provider_type.as_str() {
        "gemini" => Ok(Box::new(GeminiProvider::new(config.gemini.clone())?)),
        other => Err(crate::error::VegapunkError::Provider(format!(
            "Unknown provider type: {}",
            other
        ))
        .into()),
    }
}
