use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use serde::de::DeserializeOwned;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use capvault_core::compare_with_collection;
use capvault_core::models::{CollectionItemUpdate, Drops, NewCollectionItem};

use crate::dto::{
    CompareResponse, CreateKeycapRequest, CreateKeycapResponse, DebugScraperResponse,
    DropResponse, DropsQuery, HealthResponse, KeycapQuery, KeycapResponse, SuccessResponse,
    UpdateKeycapRequest,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Products shown by the scraper debug endpoint.
const DEBUG_SAMPLE: usize = 5;

/// Build the full router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/keycaps", get(list_keycaps).post(add_keycap))
        .route("/api/keycaps/{id}", put(update_keycap).delete(delete_keycap))
        .route("/api/drops", get(get_drops))
        .route("/api/compare", get(compare))
        .route("/api/debug/scraper", get(debug_scraper));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

/// Parse a JSON request body, treating an empty body or `{}` as missing.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let value: serde_json::Value = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON: {e}")))?
    };

    let empty = match &value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return Err(ApiError::BadRequest("No data provided".into()));
    }

    serde_json::from_value(value).map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ---------------------------------------------------------------------------
// Keycaps
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/keycaps",
    params(KeycapQuery),
    responses(
        (status = 200, description = "Keycaps in the collection", body = [KeycapResponse]),
        (status = 503, description = "Storage unavailable", body = crate::dto::ErrorResponse),
    ),
    tag = "keycaps"
)]
pub async fn list_keycaps(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeycapQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .db
        .keycap_repo()
        .list(query.vendor.as_deref())
        .await?;

    let response: Vec<KeycapResponse> = items.into_iter().map(KeycapResponse::from).collect();
    Ok(axum::Json(response))
}

#[utoipa::path(
    post,
    path = "/api/keycaps",
    request_body = CreateKeycapRequest,
    responses(
        (status = 201, description = "Keycap added", body = CreateKeycapResponse),
        (status = 400, description = "Missing or invalid body", body = crate::dto::ErrorResponse),
    ),
    tag = "keycaps"
)]
pub async fn add_keycap(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: CreateKeycapRequest = parse_body(&body)?;
    let item = NewCollectionItem::from(request);
    let id = state.db.keycap_repo().insert(&item).await?;

    Ok((StatusCode::CREATED, axum::Json(CreateKeycapResponse { id })))
}

#[utoipa::path(
    put,
    path = "/api/keycaps/{id}",
    params(
        ("id" = Uuid, Path, description = "Keycap ID")
    ),
    request_body = UpdateKeycapRequest,
    responses(
        (status = 200, description = "Whether a keycap was updated", body = SuccessResponse),
        (status = 400, description = "Missing or invalid body", body = crate::dto::ErrorResponse),
    ),
    tag = "keycaps"
)]
pub async fn update_keycap(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: UpdateKeycapRequest = parse_body(&body)?;
    let update = CollectionItemUpdate::from(request);
    let success = state.db.keycap_repo().update(id, &update).await?;

    Ok(axum::Json(SuccessResponse { success }))
}

#[utoipa::path(
    delete,
    path = "/api/keycaps/{id}",
    params(
        ("id" = Uuid, Path, description = "Keycap ID")
    ),
    responses(
        (status = 200, description = "Whether a keycap was deleted", body = SuccessResponse),
    ),
    tag = "keycaps"
)]
pub async fn delete_keycap(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let success = state.db.keycap_repo().delete(id).await?;
    Ok(axum::Json(SuccessResponse { success }))
}

// ---------------------------------------------------------------------------
// Drops
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/drops",
    params(DropsQuery),
    responses(
        (status = 200, description = "Current group-buy drops", body = [DropResponse]),
        (status = 503, description = "Storage unavailable", body = crate::dto::ErrorResponse),
    ),
    tag = "drops"
)]
pub async fn get_drops(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DropsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let drops = state.drop_service().run_scrape(query.force()).await?;

    let response: Vec<DropResponse> = match drops {
        Drops::Stored(snapshot) => snapshot.products.into_iter().map(Into::into).collect(),
        Drops::Scraped { products, .. } => products.into_iter().map(Into::into).collect(),
    };
    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/api/compare",
    responses(
        (status = 200, description = "Latest drops split by ownership", body = CompareResponse),
        (status = 503, description = "Storage unavailable", body = crate::dto::ErrorResponse),
    ),
    tag = "drops"
)]
pub async fn compare(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let result =
        compare_with_collection(&state.db.snapshot_repo(), &state.db.keycap_repo()).await?;

    let response = CompareResponse {
        matches: result.matches.into_iter().map(Into::into).collect(),
        missing: result.missing.into_iter().map(Into::into).collect(),
    };
    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/api/debug/scraper",
    responses(
        (status = 200, description = "Result of a forced scrape", body = DebugScraperResponse),
        (status = 503, description = "Storage unavailable", body = crate::dto::ErrorResponse),
    ),
    tag = "drops"
)]
pub async fn debug_scraper(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Manual scraper run triggered");
    let stored = state.drop_service().scrape_and_store().await?;
    let report = stored.report;

    let response = DebugScraperResponse {
        status: "success".to_string(),
        count: report.products.len(),
        snapshot_id: stored.snapshot_id,
        pages_fetched: report.stats.pages_fetched,
        pages_failed: report.stats.pages_failed,
        timed_out: report.stats.timed_out,
        drops: report
            .products
            .into_iter()
            .take(DEBUG_SAMPLE)
            .map(Into::into)
            .collect(),
    };
    Ok(axum::Json(response))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, response) = match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            HealthResponse {
                status: "healthy",
                database: "ok",
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthResponse {
                    status: "unhealthy",
                    database: "error",
                },
            )
        }
    };

    (status, axum::Json(response))
}
