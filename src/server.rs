//! HTTP front end for one shared session.
//!
//! Serves a single [`Session`] behind a password. Requests are serialised
//! through a mutex: one upload or question runs at a time, matching the
//! one-owner model of a session.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (no auth) |
//! | `POST` | `/upload?name=<n>` | Upload log text (raw body); replaces the active store |
//! | `GET`  | `/document` | Info about the active upload |
//! | `POST` | `/ask` | `{"question": "..."}` → `{"question", "answer", "blocked"}` |
//! | `GET`  | `/history` | All answered questions, oldest first |
//!
//! # Authentication
//!
//! Every endpoint except `/health` requires `Authorization: Bearer <password>`.
//! The password comes from the environment variable named by
//! `[server].password_env`; the server refuses to start without it.
//! Only SHA-256 digests are compared, in constant time.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "no_document", "message": "no log file has been uploaded yet" } }
//! ```
//!
//! Error codes: `unauthorized` (401), `bad_request` (400, including malformed
//! JSON bodies), `empty_document` (400),
//! `not_found` (404), `no_document` (409), `embedding_error` (502), `model_error` (502),
//! `internal` (500).

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use logqa_core::models::{DocumentInfo, QaEntry};
use logqa_core::session::Session;

use crate::config::Config;
use crate::ingest::{decode_log, open_session, upload_text};
use crate::progress::{report_blocked, ProgressMode, ProgressReporter};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
    /// SHA-256 of the shared password.
    password_digest: Arc<Vec<u8>>,
    reporter: Arc<dyn ProgressReporter>,
}

impl AppState {
    pub fn new(session: Session, password: &str, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            password_digest: Arc::new(Sha256::digest(password.as_bytes()).to_vec()),
            reporter,
        }
    }
}

/// Build the router. `max_upload_bytes` caps the `/upload` request body.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/upload", post(handle_upload))
        .route("/document", get(handle_document))
        .route("/ask", post(handle_ask))
        .route("/history", get(handle_history))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Start the server on `bind` (or `[server].bind`), reporting upload
/// progress in `progress` mode.
///
/// Validates the password variable and both providers before binding, so
/// configuration mistakes surface at startup.
pub async fn run_server(
    config: &Config,
    bind: Option<String>,
    progress: ProgressMode,
) -> anyhow::Result<()> {
    let password_env = &config.server.password_env;
    let password = match std::env::var(password_env) {
        Ok(p) if !p.is_empty() => p,
        _ => anyhow::bail!(
            "{} environment variable not set; the server requires a password",
            password_env
        ),
    };

    let session = open_session(config)?;
    let session_id = session.id();
    let state = AppState::new(session, &password, Arc::from(progress.reporter()));
    let app = router(state, config.server.max_upload_mb * 1024 * 1024);

    let bind_addr = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    println!(
        "logqa server listening on http://{} (session {})",
        listener.local_addr()?,
        session_id
    );
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::new(StatusCode::BAD_REQUEST, "bad_request", rejection.body_text())
    }
}

impl From<logqa_core::Error> for AppError {
    fn from(err: logqa_core::Error) -> Self {
        use logqa_core::Error;
        let status = match &err {
            Error::EmptyQuestion | Error::EmptyDocument => StatusCode::BAD_REQUEST,
            Error::NoDocument => StatusCode::CONFLICT,
            Error::Embedding(_) | Error::Model(_) => StatusCode::BAD_GATEWAY,
        };
        AppError::new(status, err.code(), err.to_string())
    }
}

/// Map an `anyhow` error from the upload path, keeping core error codes.
fn classify_error(err: anyhow::Error) -> AppError {
    match err.downcast::<logqa_core::Error>() {
        Ok(core) => core.into(),
        Err(other) => AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            format!("{:#}", other),
        ),
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let given = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();

    if secrets_match(given, &state.password_digest) {
        Ok(())
    } else {
        Err(AppError::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or incorrect password",
        ))
    }
}

/// Compare `given` against a stored SHA-256 digest without early exit.
fn secrets_match(given: &str, expected_digest: &[u8]) -> bool {
    let digest = Sha256::digest(given.as_bytes());
    digest.len() == expected_digest.len()
        && digest
            .iter()
            .zip(expected_digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /upload ============

#[derive(Deserialize)]
struct UploadParams {
    name: Option<String>,
}

async fn handle_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<DocumentInfo>, AppError> {
    authorize(&state, &headers)?;

    let text = decode_log(body.to_vec())
        .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, "bad_request", e.to_string()))?;
    let name = params
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "upload.log".to_string());

    let mut session = state.session.lock().await;
    let info = upload_text(&mut session, &name, &text, state.reporter.as_ref())
        .await
        .map_err(classify_error)?;
    Ok(Json(info))
}

// ============ GET /document ============

async fn handle_document(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DocumentInfo>, AppError> {
    authorize(&state, &headers)?;
    let session = state.session.lock().await;
    session
        .document()
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, "not_found", "no log file uploaded"))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    /// The question as sent to the model (the warning text when blocked).
    question: String,
    answer: String,
    blocked: bool,
}

async fn handle_ask(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, AppError> {
    authorize(&state, &headers)?;
    let Json(req) = body?;

    let mut session = state.session.lock().await;
    let outcome = session.ask(&req.question).await?;
    if let Some(pattern) = &outcome.blocked_pattern {
        report_blocked(&session.id().to_string(), pattern);
    }

    Ok(Json(AskResponse {
        question: outcome.entry.question,
        answer: outcome.entry.answer,
        blocked: outcome.blocked_pattern.is_some(),
    }))
}

// ============ /history ============

#[derive(Serialize)]
struct HistoryResponse {
    entries: Vec<QaEntry>,
}

async fn handle_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<HistoryResponse>, AppError> {
    authorize(&state, &headers)?;
    let session = state.session.lock().await;
    Ok(Json(HistoryResponse {
        entries: session.history().to_vec(),
    }))
}
