// Copyright (c) 2026 Config Server Contributors
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `PUT /v1/data` | store a raw value |
//! | `GET /v1/data?name=` | history of a name, newest first |
//! | `GET /v1/data/{id}` | one version |
//! | `POST /v1/data` | generate a credential |
//! | `DELETE /v1/data?name=` | delete a name's history |
//! | `GET /health` | liveness, never authenticated |
//!
//! Core calls are synchronous and may do CPU-heavy key generation, so each
//! one runs on the blocking pool.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::application::{ConvergenceController, CredentialGenerator};
use crate::domain::configuration::{Configuration, ConfigurationId, ConfigurationValue};
use crate::domain::credential::{CredentialRequest, CredentialType, GenerationMode};
use crate::domain::error::{ConfigServerError, ErrorKind};
use crate::domain::repository::ConfigurationStore;
use crate::domain::server_config::CertificateDefaults;
use crate::presentation::auth::{self, JwtVerifier};

pub const UNSUPPORTED_MEDIA_TYPE_MESSAGE: &str = "Unsupported Media Type - Accepts application/json only";

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub struct AppState {
    pub store: Arc<dyn ConfigurationStore>,
    pub controller: Arc<ConvergenceController>,
    pub verifier: Option<JwtVerifier>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ConfigurationStore>,
        defaults: CertificateDefaults,
        verifier: Option<JwtVerifier>,
    ) -> Arc<Self> {
        let generator = CredentialGenerator::new(store.clone(), defaults);
        let controller = Arc::new(ConvergenceController::new(store.clone(), generator));
        Arc::new(Self {
            store,
            controller,
            verifier,
        })
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let v1 = Router::new()
        .route(
            "/v1/data",
            get(get_by_name)
                .put(put_configuration)
                .post(generate_credential)
                .delete(delete_configuration),
        )
        .route("/v1/data/", axum::routing::put(put_configuration).post(generate_credential))
        .route("/v1/data/{id}", get(get_by_id))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer));

    Router::new()
        .route("/health", get(health))
        .merge(v1)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
}

/// Boundary error, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Core(ConfigServerError),
    BadRequest(String),
    UnsupportedMediaType,
    Unauthorized(String),
    Internal,
}

impl From<ConfigServerError> for ApiError {
    fn from(err: ConfigServerError) -> Self {
        ApiError::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Core(err) => match err.kind() {
                ErrorKind::InvalidName | ErrorKind::MissingCa => (StatusCode::BAD_REQUEST, err.to_string()),
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                ErrorKind::Generation | ErrorKind::Storage => {
                    error!(error = %err, "Request failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string())
                }
            },
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                UNSUPPORTED_MEDIA_TYPE_MESSAGE.to_string(),
            ),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// External shape of one version; the checksum stays internal.
#[derive(Debug, Serialize)]
pub struct ConfigurationResponse {
    pub id: ConfigurationId,
    pub name: String,
    pub value: ConfigurationValue,
}

impl From<Configuration> for ConfigurationResponse {
    fn from(config: Configuration) -> Self {
        Self {
            id: config.id,
            name: config.name,
            value: config.value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PutRequest {
    name: String,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    name: String,
    #[serde(rename = "type")]
    credential_type: String,
    #[serde(default)]
    parameters: Option<Value>,
    #[serde(default)]
    mode: GenerationMode,
}

#[derive(Debug, Deserialize)]
struct NameQuery {
    name: Option<String>,
}

impl NameQuery {
    fn required(self) -> Result<String, ApiError> {
        self.name
            .ok_or_else(|| ApiError::BadRequest("The query parameter name is required".to_string()))
    }
}

fn parse_json<T: DeserializeOwned>(headers: &HeaderMap, body: &Bytes) -> Result<T, ApiError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false);
    if !is_json {
        return Err(ApiError::UnsupportedMediaType);
    }

    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Request body is not valid JSON: {}", e)))
}

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ConfigServerError> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(error = %e, "Blocking task failed");
        ApiError::Internal
    })?;
    Ok(result?)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn put_configuration(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    let request: PutRequest = parse_json(&headers, &body)?;
    let store = state.store.clone();

    let config = run_blocking(move || {
        let value = ConfigurationValue::from(request.value);
        let id = store.put(&request.name, value.clone(), None)?;
        Ok(Configuration {
            id,
            name: request.name,
            value,
            checksum: None,
        })
    })
    .await?;

    info!(name = %config.name, id = %config.id, "Stored configuration");
    Ok(Json(config.into()))
}

async fn get_by_name(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Value>, ApiError> {
    let name = query.required()?;
    let store = state.store.clone();

    let versions = run_blocking(move || store.get_by_name(&name)).await?;
    let data: Vec<ConfigurationResponse> = versions.into_iter().map(Into::into).collect();
    Ok(Json(json!({ "data": data })))
}

async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    let store = state.store.clone();
    let config = run_blocking(move || store.get_by_id(&id)).await?;
    Ok(Json(config.into()))
}

async fn generate_credential(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ConfigurationResponse>, ApiError> {
    let request: GenerateRequest = parse_json(&headers, &body)?;

    let credential_type: CredentialType = request.credential_type.parse().map_err(ApiError::BadRequest)?;
    let parameters = match request.parameters {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(ApiError::BadRequest("parameters must be a JSON object".to_string()));
        }
    };

    let request = CredentialRequest::new(request.name, credential_type)
        .with_parameters(parameters)
        .with_mode(request.mode);
    let controller = state.controller.clone();

    let config = run_blocking(move || controller.provide(&request)).await?;
    Ok(Json(config.into()))
}

async fn delete_configuration(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NameQuery>,
) -> Result<StatusCode, ApiError> {
    let name = query.required()?;
    let store = state.store.clone();

    let removed = run_blocking({
        let name = name.clone();
        move || store.delete(&name)
    })
    .await?;

    info!(name = %name, versions = removed, "Deleted configuration");
    Ok(StatusCode::NO_CONTENT)
}
