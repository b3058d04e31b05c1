//! HTTP front end: a JSON index of the store, downloadable PEM attachments
//! and decoded certificate chains.
//!
//! The store file is re-read on every request so that renewals written by
//! the ACME resolver show up without a restart.

use acmex_lib::{
    AcmexError, AttachmentKind, CertificateEntry, EmptyStoreError, InvalidEncodingError, LoadError,
    MalformedCertificateError, Store,
};
use anyhow::Context;
use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Attachment formats served under `/attachment/:domain/:file`.
const FORMATS: [&str; 2] = ["pem", "txt"];

#[derive(Clone)]
struct AppState {
    store_path: Arc<PathBuf>,
}

/// Build the router serving the store at `store_path`.
pub fn router(store_path: PathBuf) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/attachment/:domain/:file", get(attachment))
        .route("/certificate/:domain", get(certificate))
        .layer(middleware::from_fn(log_request))
        .with_state(AppState {
            store_path: Arc::new(store_path),
        })
}

/// Bind `listen` and serve until Ctrl-C.
pub async fn run(store_path: PathBuf, listen: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;
    tracing::info!(
        address = %listener.local_addr()?,
        store = %store_path.display(),
        "serving certificate store"
    );

    axum::serve(listener, router(store_path))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        return;
    }
    tracing::info!("shutting down");
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(req).await;
    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Handler failure, rendered as a plain-text response.
#[derive(Debug)]
enum ApiError {
    Store(AcmexError),
    NotFound(String),
    BadRequest(String),
    NotAcceptable,
    Internal(String),
}

macro_rules! api_error_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for ApiError {
            fn from(e: $ty) -> Self {
                ApiError::Store(e.into())
            }
        })*
    };
}

api_error_from!(
    LoadError,
    EmptyStoreError,
    InvalidEncodingError,
    MalformedCertificateError
);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(AcmexError::Load(_) | AcmexError::Decode(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Store(AcmexError::EmptyStore(_) | AcmexError::UnknownResolver(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Store(e) => e.to_string(),
            ApiError::NotFound(m) | ApiError::BadRequest(m) | ApiError::Internal(m) => m,
            ApiError::NotAcceptable => "only application/json is available".to_string(),
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        }
        (status, message).into_response()
    }
}

// ---------------------------------------------------------------------------
// Store access
// ---------------------------------------------------------------------------

async fn load(state: &AppState) -> Result<Store, ApiError> {
    let path = Arc::clone(&state.store_path);
    let store = tokio::task::spawn_blocking(move || acmex_lib::read_store(&path))
        .await
        .map_err(|e| ApiError::Internal(format!("store reader panicked: {}", e)))??;
    Ok(store)
}

fn lookup<'a>(store: &'a Store, domain: &str) -> Result<&'a CertificateEntry, ApiError> {
    acmex_lib::find_certificate(store, domain)?
        .ok_or_else(|| ApiError::NotFound(format!("no certificate for domain '{}'", domain)))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct IndexPage {
    data: IndexData,
}

#[derive(Debug, Serialize)]
struct IndexData {
    title: &'static str,
    index: Vec<IndexItem>,
}

#[derive(Debug, Serialize)]
struct IndexItem {
    id: String,
    domain: String,
    sans: Vec<String>,
    files: Vec<FileLink>,
}

#[derive(Debug, Serialize)]
struct FileLink {
    href: String,
    title: &'static str,
}

/// True when the `Accept` header is absent or admits a JSON response.
fn accepts_json(headers: &HeaderMap) -> bool {
    let Some(accept) = headers.get(header::ACCEPT) else {
        return true;
    };
    let Ok(accept) = accept.to_str() else {
        return false;
    };
    accept.split(',').any(|item| {
        let media = item.split(';').next().unwrap_or_default().trim();
        matches!(media, "application/json" | "application/*" | "*/*")
    })
}

fn index_item(entry: &CertificateEntry) -> IndexItem {
    let domain = entry.domain.main.clone();
    let files = AttachmentKind::ALL
        .into_iter()
        .map(|kind| FileLink {
            href: format!("/attachment/{}/{}.pem", domain, kind),
            title: match kind {
                AttachmentKind::Fullchain => "Certificate",
                AttachmentKind::Key => "Private Key",
            },
        })
        .collect();
    IndexItem {
        id: domain.clone(),
        sans: entry.domain.sans().to_vec(),
        domain,
        files,
    }
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    if !accepts_json(&headers) {
        return Err(ApiError::NotAcceptable);
    }
    let store = load(&state).await?;
    let entries = acmex_lib::list_certificates(&store)?;
    let page = IndexPage {
        data: IndexData {
            title: "Index of /",
            index: entries.iter().map(index_item).collect(),
        },
    };
    Ok(Json(page).into_response())
}

async fn attachment(
    State(state): State<AppState>,
    Path((domain, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (kind_name, format) = file
        .rsplit_once('.')
        .ok_or_else(|| ApiError::BadRequest(format!("bad attachment name '{}'", file)))?;
    let kind = AttachmentKind::from_name(kind_name)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown attachment '{}'", kind_name)))?;
    let format = format.to_ascii_lowercase();
    if !FORMATS.contains(&format.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "unknown attachment format '{}'",
            format
        )));
    }

    let store = load(&state).await?;
    let content = kind.extract(lookup(&store, &domain)?)?;

    if format == "txt" {
        return Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            content,
        )
            .into_response());
    }

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}.{}\"",
        kind, format
    ))
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/x-pem-file")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

async fn certificate(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Response, ApiError> {
    let store = load(&state).await?;
    let pem = acmex_lib::extract_chain_pem(lookup(&store, &domain)?)?;
    let certs = acmex_lib::inspect_now(&pem)?;
    Ok(Json(certs).into_response())
}
