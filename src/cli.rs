//! Command-line interface definition for Vegapunk
//!
//! This module defines the CLI structure using clap's derive API. The
//! application has a single job (serving the chat page), so the CLI is a
//! flat set of flags rather than subcommands.

use clap::Parser;

/// Vegapunk - persona chat web application
///
/// Serves a single-page chat UI that forwards text and images to a
/// multimodal generative AI API and renders the conversation.
#[derive(Parser, Debug, Clone)]
#[command(name = "vegapunk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the socket address to listen on (e.g. 127.0.0.1:8080)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Override the generation model from config
    #[arg(short, long)]
    pub model: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
