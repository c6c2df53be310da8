//! REST API Handlers
//!
//! Admin endpoints for chains and their RPC nodes, plus health, readiness
//! and metrics.

use super::metrics::ApiMetrics;
use crate::digest::PrefixRegistry;
use crate::error::Error;
use crate::registry::{NodeRegistries, Page, PaginationLinks};
use axum::{
    extract::{rejection::JsonRejection, Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Raw paging parameters; parsed by the registry so malformed values are
/// reported as `invalid_page`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub size: Option<String>,
}

/// Node enable/disable request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMeta {
    pub count: usize,
}

/// Paginated list envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub meta: ListMeta,
    #[serde(default)]
    pub links: PaginationLinks,
}

impl<T> From<Page<T>> for ListResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            data: page.items,
            meta: ListMeta { count: page.total },
            links: page.links,
        }
    }
}

/// Endpoint class entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointClassResponse {
    pub name: String,
    pub prefix: String,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn error_response(err: Error) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        debug!("Request rejected: {}", err);
    }

    let details = match &err {
        Error::Validation { field, .. } => Some(field.clone()),
        _ => None,
    };

    (
        status,
        Json(ApiErrorResponse {
            error: err.code().into(),
            message: err.to_string(),
            details,
        }),
    )
        .into_response()
}

fn json_rejection(rejection: JsonRejection) -> Response {
    (
        rejection.status(),
        Json(ApiErrorResponse {
            error: "bad_request".into(),
            message: rejection.body_text(),
            details: None,
        }),
    )
        .into_response()
}

// =============================================================================
// REST Router
// =============================================================================

/// REST API router builder
pub struct RestRouter {
    registries: NodeRegistries,
    prefixes: Arc<PrefixRegistry>,
    metrics: Arc<ApiMetrics>,
}

impl RestRouter {
    pub fn new(registries: NodeRegistries, prefixes: Arc<PrefixRegistry>, metrics: Arc<ApiMetrics>) -> Self {
        Self {
            registries,
            prefixes,
            metrics,
        }
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        let state = AppState {
            registries: self.registries,
            prefixes: self.prefixes,
            metrics: self.metrics,
        };

        Router::new()
            // Chain endpoints
            .route("/v2/chains/:family", get(list_chains))
            .route("/v2/chains/:family/:chain_id", get(get_chain))
            // Node endpoints
            .route(
                "/v2/chains/:family/:chain_id/nodes",
                get(list_nodes).post(create_node),
            )
            .route(
                "/v2/chains/:family/:chain_id/nodes/:name",
                get(get_node).patch(set_node_enabled).delete(delete_node),
            )
            // Digest prefixes
            .route("/v2/endpoint_classes", get(list_endpoint_classes))
            // Health and metrics
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .route("/metrics", get(metrics))
            .with_state(state)
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    registries: NodeRegistries,
    prefixes: Arc<PrefixRegistry>,
    metrics: Arc<ApiMetrics>,
}

// =============================================================================
// Chain Handlers
// =============================================================================

async fn list_chains(
    State(state): State<AppState>,
    Path(family): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let result = state
        .registries
        .by_name(&family)
        .and_then(|registry| registry.list_chains(query.page.as_deref(), query.size.as_deref()));

    match result {
        Ok(page) => (StatusCode::OK, Json(ListResponse::from(page))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_chain(
    State(state): State<AppState>,
    Path((family, chain_id)): Path<(String, String)>,
) -> Response {
    match state
        .registries
        .by_name(&family)
        .and_then(|registry| registry.chain(&chain_id))
    {
        Ok(chain) => (StatusCode::OK, Json(chain)).into_response(),
        Err(e) => error_response(e),
    }
}

// =============================================================================
// Node Handlers
// =============================================================================

async fn list_nodes(
    State(state): State<AppState>,
    Path((family, chain_id)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Response {
    let registry = match state.registries.by_name(&family) {
        Ok(registry) => registry,
        Err(e) => return error_response(e),
    };

    match registry
        .list_nodes(&chain_id, query.page.as_deref(), query.size.as_deref())
        .await
    {
        Ok(page) => (StatusCode::OK, Json(ListResponse::from(page))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn create_node(
    State(state): State<AppState>,
    Path((family, chain_id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    let registry = match state.registries.by_name(&family) {
        Ok(registry) => registry,
        Err(e) => return error_response(e),
    };

    match registry.create_node(&chain_id, input).await {
        Ok(record) => {
            info!(family = %family, chain_id = %chain_id, "Node created via API");
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn get_node(
    State(state): State<AppState>,
    Path((family, chain_id, name)): Path<(String, String, String)>,
) -> Response {
    let registry = match state.registries.by_name(&family) {
        Ok(registry) => registry,
        Err(e) => return error_response(e),
    };

    match registry.get_node(&chain_id, &name).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn set_node_enabled(
    State(state): State<AppState>,
    Path((family, chain_id, name)): Path<(String, String, String)>,
    body: Result<Json<SetEnabledRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    let registry = match state.registries.by_name(&family) {
        Ok(registry) => registry,
        Err(e) => return error_response(e),
    };

    match registry.set_enabled(&chain_id, &name, request.enabled).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn delete_node(
    State(state): State<AppState>,
    Path((family, chain_id, name)): Path<(String, String, String)>,
) -> Response {
    let registry = match state.registries.by_name(&family) {
        Ok(registry) => registry,
        Err(e) => return error_response(e),
    };

    match registry.delete_node(&chain_id, &name).await {
        Ok(_) => {
            info!(family = %family, chain_id = %chain_id, name = %name, "Node deleted via API");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(e),
    }
}

// =============================================================================
// Misc Handlers
// =============================================================================

async fn list_endpoint_classes(State(state): State<AppState>) -> impl IntoResponse {
    let classes: Vec<EndpointClassResponse> = state
        .prefixes
        .iter()
        .map(|(name, prefix)| EndpointClassResponse {
            name: name.to_string(),
            prefix: prefix.to_string(),
        })
        .collect();

    (StatusCode::OK, Json(classes))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    for (family, registry) in state.registries.iter() {
        if let Err(e) = registry.node_count().await {
            warn!(family = %family, "Readiness check failed: {}", e);
            return (StatusCode::SERVICE_UNAVAILABLE, "not ready");
        }
    }
    (StatusCode::OK, "ready")
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render(&state.registries).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, state.metrics.content_type())],
            body,
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
