//! Web presentation layer for Vegapunk
//!
//! This module wires the session store, dispatcher, and banner loader into
//! an axum application and serves the single chat page.

pub mod handlers;
pub mod render;

use crate::banner::BannerLoader;
use crate::config::{Config, UiConfig};
use crate::dispatch::ChatDispatcher;
use crate::error::{Result, VegapunkError};
use crate::providers::create_provider;
use crate::session::SessionStore;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state for the handlers
#[derive(Clone)]
pub struct AppState {
    /// Page styling and decoration
    pub ui: UiConfig,
    /// Chat dispatcher, possibly without a provider
    pub dispatcher: Arc<ChatDispatcher>,
    /// Cookie-scoped session store
    pub sessions: SessionStore,
    /// Remote banner loader
    pub banner: Arc<BannerLoader>,
}

/// Build the application router
///
/// Exposed separately from [`serve`] so tests can drive the router without
/// binding a socket.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/chat", post(handlers::submit_chat))
        .route("/assets/banner", get(handlers::banner_asset))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build application state from configuration
///
/// A missing credential or failing provider initialization does not abort:
/// the application serves the page and degrades chat replies to apologies.
///
/// # Errors
///
/// Returns error if the banner HTTP client cannot be created
pub fn build_state(config: &Config) -> Result<AppState> {
    let provider = if config.provider.gemini.api_key.is_some() {
        match create_provider(&config.provider) {
            Ok(provider) => Some(provider),
            Err(e) => {
                tracing::error!("Failed to initialize provider: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    if provider.is_none() {
        tracing::warn!("No provider configured; chat replies will degrade to apologies");
    }

    let banner = BannerLoader::new(
        &config.ui.banner_image_url,
        config.ui.fetch_timeout_seconds,
        config.ui.max_banner_bytes,
    )?;

    Ok(AppState {
        ui: config.ui.clone(),
        dispatcher: Arc::new(ChatDispatcher::new(provider)),
        sessions: SessionStore::new(config.session.ttl_seconds),
        banner: Arc::new(banner),
    })
}

/// Serve the chat application until the process is stopped
///
/// # Errors
///
/// Returns error if the bind address is invalid or the listener fails
pub async fn serve(config: Config) -> Result<()> {
    let state = build_state(&config)?;
    let router = build_router(state, config.server.max_upload_bytes);

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|e| VegapunkError::Config(format!("Invalid bind address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}
