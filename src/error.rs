//! Error types for Vegapunk
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Vegapunk operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, provider interactions, image handling, and
/// session management.
#[derive(Error, Debug)]
pub enum VegapunkError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, response parsing, etc.)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Image decoding/encoding errors
    #[error("Image error: {0}")]
    Image(String),

    /// Fetch-related errors (banner download, schemes, size limits)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Session store errors (lock acquisition)
    #[error("Session error: {0}")]
    Session(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Vegapunk operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
