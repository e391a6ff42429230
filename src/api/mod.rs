//! REST API endpoints.
//!
//! Axum-based HTTP API over the local data lake. Standings are computed on
//! request from stored results; calendars and standings fall back to the
//! Jolpica API when the store has nothing for the season asked about.

pub mod routes;
pub mod state;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::jolpica::JolpicaError;
use crate::storage::StorageError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Upstream error: {0}")]
    BadGateway(String),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        error!("Storage error: {}", e);
        ApiError::Internal(e.to_string())
    }
}

impl From<JolpicaError> for ApiError {
    fn from(e: JolpicaError) -> Self {
        warn!("Jolpica request failed: {}", e);
        ApiError::BadGateway(e.to_string())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::BadGateway(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Where a response's data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Database,
    Jolpica,
}

/// Response envelope.
#[derive(Debug, Serialize)]
pub struct Sourced<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> Sourced<T> {
    pub fn database(data: T) -> Self {
        Self {
            data,
            source: DataSource::Database,
        }
    }

    pub fn jolpica(data: T) -> Self {
        Self {
            data,
            source: DataSource::Jolpica,
        }
    }
}

/// Envelope for paginated lists.
#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
    pub source: DataSource,
}

/// Pagination parameters.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(50).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.page_size
    }

    /// Cut one page out of a fully loaded list.
    pub fn apply<T>(&self, items: Vec<T>) -> Paged<T> {
        let meta = PaginationMeta::new(self, items.len() as u32);
        let data = items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.page_size as usize)
            .collect();

        Paged {
            data,
            pagination: meta,
            source: DataSource::Database,
        }
    }
}

/// Pagination metadata in responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u32) -> Self {
        let total_pages = total_items.div_ceil(pagination.page_size);
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            total_items,
            total_pages,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1,
        }
    }
}

/// Parse a `{year}` path segment.
pub(crate) fn parse_season(raw: &str) -> Result<u16, ApiError> {
    match raw.parse::<u16>() {
        Ok(year) if (1950..=2100).contains(&year) => Ok(year),
        _ => Err(ApiError::BadRequest(format!("invalid season '{}'", raw))),
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match origin {
        "*" => cors.allow_origin(Any),
        origin => match HeaderValue::from_str(origin) {
            Ok(value) => cors.allow_origin(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                cors
            }
        },
    }
}

/// Build the application router with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.cors_origin);

    Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/drivers", get(routes::drivers::list_drivers))
        .route("/api/drivers/:key", get(routes::drivers::get_driver))
        .route("/api/constructors", get(routes::constructors::list_constructors))
        .route("/api/constructors/:key", get(routes::constructors::get_constructor))
        .route("/api/circuits", get(routes::circuits::list_circuits))
        .route("/api/seasons", get(routes::seasons::list_seasons))
        .route("/api/seasons/:year", get(routes::seasons::get_season))
        .route("/api/results/:year/:round", get(routes::results::race_results))
        .route("/api/standings/:year", get(routes::standings::standings))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
