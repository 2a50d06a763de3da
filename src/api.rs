//! HTTP routes for photo classification

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, DefaultBodyLimit, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_scalar::{Scalar, Servable};

use crate::classifier::{Classification, Classifier};
use crate::config::ServerConfig;
use crate::error::{AppError, ClassifyError, ErrorBody, FailureReason, ShortfallCause};
use crate::palette::{MeanColor, PaletteEntry, RankedEntry, Rgb, PALETTE};
use crate::raster::Rasterizer;
use crate::sampling::{Rejections, SamplingRegion};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    rasterizer: Arc<Rasterizer>,
    classifier: Classifier,
    config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            rasterizer: Arc::new(Rasterizer::new()),
            classifier: Classifier::default(),
            config,
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hydration Color API",
        description = "Estimates a hydration color level (1-8) from a photo",
        version = "0.1.0"
    ),
    tags(
        (name = "Classification", description = "Photo classification endpoints")
    ),
    paths(health, get_palette, classify_photo),
    components(schemas(
        ClassifyResponse,
        Classification,
        ErrorBody,
        FailureReason,
        ShortfallCause,
        PaletteEntry,
        RankedEntry,
        Rgb,
        MeanColor,
        SamplingRegion,
        Rejections
    ))
)]
struct ApiDoc;

/// Build the router with all routes and layers
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/palette", get(get_palette))
        .route("/classify", post(classify_photo))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/openapi.json", get(openapi_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Successful classification body
#[derive(Debug, Serialize, ToSchema)]
pub struct ClassifyResponse {
    /// Always `true`
    pub ok: bool,
    #[serde(flatten)]
    pub classification: Classification,
}

#[derive(Debug, Deserialize)]
pub struct ClassifyParams {
    region_size: Option<u32>,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
async fn health() -> &'static str {
    "ok"
}

/// Get OpenAPI JSON specification
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Reference palette
///
/// Returns the 8 reference colors, palest first.
#[utoipa::path(
    get,
    path = "/palette",
    tag = "Classification",
    responses(
        (status = 200, description = "Reference palette", body = Vec<PaletteEntry>)
    )
)]
async fn get_palette() -> Json<Vec<PaletteEntry>> {
    Json(PALETTE.to_vec())
}

/// Classify a photo
///
/// The body is the encoded photo. The centered square region is sampled
/// and matched against the reference palette.
#[utoipa::path(
    post,
    path = "/classify",
    tag = "Classification",
    params(
        ("region_size" = Option<u32>, Query, description = "Side of the centered sampling square in canvas pixels (clamped to 520x360)")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "JPEG or PNG photo"),
    responses(
        (status = 200, description = "Classification", body = ClassifyResponse),
        (status = 400, description = "Body is not a decodable image, or the query is malformed", body = ErrorBody),
        (status = 413, description = "Upload too large"),
        (status = 422, description = "Too few usable pixels in the sampling region", body = ErrorBody)
    )
)]
async fn classify_photo(
    State(state): State<AppState>,
    params: Result<Query<ClassifyParams>, QueryRejection>,
    body: Bytes,
) -> Result<Json<ClassifyResponse>, AppError> {
    let Query(params) = params.map_err(|e| {
        tracing::warn!("Rejected query: {}", e.body_text());
        AppError::BadRequest(e.body_text())
    })?;
    let region_size = params.region_size.unwrap_or(state.config.region_size);
    tracing::info!(
        "Classify request: {} bytes, region_size={}",
        body.len(),
        region_size
    );

    let rasterizer = state.rasterizer.clone();
    let classifier = state.classifier;

    // Decoding is CPU-bound; keep it off the async workers
    let result = tokio::task::spawn_blocking(move || -> Result<Classification, ClassifyError> {
        let buffer = rasterizer.normalize(&body)?;
        classifier.classify(&buffer, region_size)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    match result {
        Ok(classification) => {
            tracing::info!(
                "Classified as level {} ({}), confidence {:.2}, {} usable pixels",
                classification.level,
                classification.label,
                classification.confidence,
                classification.usable_pixels
            );
            Ok(Json(ClassifyResponse {
                ok: true,
                classification,
            }))
        }
        Err(e) => {
            tracing::warn!("Classification rejected: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn test_palette_has_eight_levels() {
        let Json(entries) = get_palette().await;
        assert_eq!(entries.len(), 8);
        assert_eq!(entries[0].level, 1);
        assert_eq!(entries[7].label, "Very dark amber");
    }

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/classify"));
        assert!(doc.paths.paths.contains_key("/palette"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
