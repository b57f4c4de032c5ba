//! REST API Server Module
//!
//! This module provides the telemetry REST API: recording page views and
//! serving the recent counters to the dashboard, plus a health check. The
//! write path is best-effort from the page's point of view; the read path
//! surfaces store failures, since the dashboard must see them.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use warp::{
    http::{Method, StatusCode},
    Filter, Rejection, Reply,
};

use crate::config::Config;
use crate::store::{self, ViewStore};

// ============================================================================
// RESPONSE STRUCTURES
// ============================================================================

/// Success message body.
#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

/// Error body for failed requests.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Health check body.
#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// Handler for `POST /telemetry/pageview`.
///
/// Increments the counter for the current minute. Store failures are logged
/// and answered with 500; the page calling this treats the call as
/// fire-and-forget either way.
///
/// # Arguments
///
/// * `store` - The view store instance
///
/// # Returns
///
/// * `Ok(warp::Reply)` - 200 with a message, or 500 with an error body
pub async fn record_page_view_handler(
    store: Arc<dyn ViewStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match store::record_view(store.as_ref(), store::now_ms()).await {
        Ok(()) => Ok(warp::reply::with_status(
            warp::reply::json(&MessageBody {
                message: "Page view recorded successfully",
            }),
            StatusCode::OK,
        )),
        Err(_) => Ok(warp::reply::with_status(
            warp::reply::json(&ErrorBody {
                error: "Could not record page view".to_string(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR,
        )),
    }
}

/// Handler for `GET /telemetry/pageviews`.
///
/// Returns the counters recorded within the configured trailing window
/// (one hour by default) as a JSON array of `{timestamp, count}` records.
///
/// # Arguments
///
/// * `store` - The view store instance
/// * `window_ms` - Trailing window length in milliseconds
///
/// # Returns
///
/// * `Ok(warp::Reply)` - 200 with the records, or 500 with an error body
pub async fn get_page_views_handler(
    store: Arc<dyn ViewStore>,
    window_ms: u64,
) -> Result<impl warp::Reply, warp::Rejection> {
    match store::list_recent_views(store.as_ref(), window_ms, store::now_ms()).await {
        Ok(records) => Ok(warp::reply::with_status(
            warp::reply::json(&records),
            StatusCode::OK,
        )),
        Err(e) => {
            error!("Error fetching page views: {}", e);
            Ok(warp::reply::with_status(
                warp::reply::json(&ErrorBody {
                    error: "Could not fetch page views".to_string(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

// ============================================================================
// WARP FILTER HELPERS
// ============================================================================

/// Creates a warp filter that provides access to the view store.
fn with_store(
    store: Arc<dyn ViewStore>,
) -> impl Filter<Extract = (Arc<dyn ViewStore>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || store.clone())
}

/// Creates a CORS filter based on the configured allowed origins.
fn create_cors_filter(allowed_origins: &[String]) -> warp::cors::Builder {
    let methods = vec![Method::GET, Method::POST, Method::OPTIONS];

    if allowed_origins.contains(&"*".to_string()) {
        warp::cors()
            .allow_any_origin()
            .allow_methods(methods)
            .allow_headers(vec!["content-type"])
    } else {
        let origins: Vec<&str> = allowed_origins.iter().map(|s| s.as_str()).collect();
        warp::cors()
            .allow_origins(origins)
            .allow_methods(methods)
            .allow_headers(vec!["content-type"])
    }
}

// ============================================================================
// REJECTION HANDLER
// ============================================================================

/// Global rejection handler for all API routes.
///
/// Converts warp rejections into the `{error}` body shape the endpoints use.
pub async fn handle_rejection(rej: Rejection) -> Result<impl Reply, std::convert::Infallible> {
    let (status, message) = if rej.is_not_found() {
        (StatusCode::NOT_FOUND, "Endpoint not found".to_string())
    } else if rej.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        error!("Unhandled rejection: {:?}", rej);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        status,
    ))
}

// ============================================================================
// API SERVER IMPLEMENTATION
// ============================================================================

/// REST API server for the telemetry service.
pub struct ApiServer {
    /// Service configuration
    config: Arc<Config>,
    /// View counter store
    store: Arc<dyn ViewStore>,
}

impl ApiServer {
    /// Creates a new API server over the given store.
    ///
    /// # Arguments
    ///
    /// * `config` - Service configuration
    /// * `store` - View store implementation
    pub fn new(config: Config, store: Arc<dyn ViewStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Starts the API server and begins handling HTTP requests.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Server ran to completion
    /// * `Err(anyhow::Error)` - Failed to bind the configured address
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting API server on {}:{}",
            self.config.api.host, self.config.api.port
        );

        let routes = self.create_routes();

        let addr: std::net::SocketAddr =
            format!("{}:{}", self.config.api.host, self.config.api.port)
                .parse()
                .context("Failed to parse API server address")?;

        warp::serve(routes).run(addr).await;

        Ok(())
    }

    /// Creates all API routes for the server.
    pub(crate) fn create_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        let store = self.store.clone();
        let window_ms = self.config.telemetry.window_ms;

        // Health check endpoint - returns service status
        let health = warp::path("health").and(warp::get()).map(|| {
            warp::reply::json(&HealthBody { status: "healthy" })
        });

        // Record a page view in the current-minute bucket
        let record = warp::path!("telemetry" / "pageview")
            .and(warp::post())
            .and(with_store(store.clone()))
            .and_then(record_page_view_handler);

        // List the counters within the trailing window
        let list = warp::path!("telemetry" / "pageviews")
            .and(warp::get())
            .and(with_store(store))
            .and_then(move |store| get_page_views_handler(store, window_ms));

        health
            .or(record)
            .or(list)
            .with(create_cors_filter(&self.config.api.cors_origins))
            .recover(handle_rejection)
    }

    /// Public method for testing - exposes routes for integration tests
    #[allow(dead_code)] // Used by tests
    pub fn test_routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
        self.create_routes()
    }
}
