// HTTP surface - axum handlers, shared state and router

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::DefaultsConfig;
use crate::downloader::emitter;
use crate::downloader::format_selector::FormatSelector;
use crate::downloader::models::{FormatCatalog, MediaKind, MediaReference, QualityPolicy};
use crate::downloader::{Orchestrator, RelayError};

const SAMPLE_VIDEO: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub defaults: DefaultsConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(orchestrator: Orchestrator, defaults: DefaultsConfig) -> Self {
        Self {
            orchestrator,
            defaults,
        }
    }

    /// Reference from query input; a blank URL is rejected here
    fn reference(&self, query: &MediaQuery) -> Result<MediaReference, RelayError> {
        let url = query
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(RelayError::MissingReference)?;

        Ok(MediaReference::new(url)
            .with_locale(Some(self.defaults.lang.as_str()), Some(self.defaults.country.as_str()))
            .with_locale(query.lang.as_deref(), query.country.as_deref()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaQuery {
    pub url: Option<String>,
    pub quality: Option<String>,
    pub format: Option<String>,
    pub lang: Option<String>,
    pub country: Option<String>,
}

/// JSON failure body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: &'a str,
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tried_formats: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    example: Option<String>,
    timestamp: String,
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

fn error_response(err: &RelayError, example: Option<String>) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        tracing::error!("[relay] {}", err);
    } else {
        tracing::warn!("[relay] {}", err);
    }

    let body = ErrorBody {
        error: status.canonical_reason().unwrap_or("Error"),
        kind: err.kind(),
        message: err.to_string(),
        tried_formats: err.tried_formats(),
        suggestion: err.suggestion(),
        example,
        timestamp: timestamp(),
    };

    (status, Json(body)).into_response()
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        error_response(&self, None)
    }
}

fn route_for(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Audio => "/musica",
        MediaKind::Video => "/clipe",
    }
}

type QueryResult = Result<Query<MediaQuery>, QueryRejection>;

/// Decoded query, or the structured 400 for a malformed one
fn decode_query(query: QueryResult, example: String) -> Result<MediaQuery, Response> {
    query.map(|Query(query)| query).map_err(|rejection| {
        let err = RelayError::InvalidQuery(rejection.body_text());
        error_response(&err, Some(example))
    })
}

async fn relay_media(state: &AppState, kind: MediaKind, query: QueryResult) -> Response {
    let example = format!("{}?url={}", route_for(kind), SAMPLE_VIDEO);
    let query = match decode_query(query, example.clone()) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let reference = match state.reference(&query) {
        Ok(reference) => reference,
        Err(err) => return error_response(&err, Some(example)),
    };
    let policy = QualityPolicy::parse(query.quality.as_deref());

    tracing::info!("[relay] {} request for {} ({})", kind, reference.url, policy);

    match state
        .orchestrator
        .resolve_and_download(&reference, kind, query.format.as_deref(), &policy)
        .await
    {
        Ok(resolved) => {
            tracing::info!(
                "[relay] Relaying {} format {} after trying {}",
                kind,
                resolved.format_id,
                resolved.tried.join(", ")
            );
            emitter::emit(kind, &resolved.format_id, resolved.download)
        }
        Err(err) => err.into_response(),
    }
}

/// GET /musica
pub async fn musica(State(state): State<SharedState>, query: QueryResult) -> Response {
    relay_media(&state, MediaKind::Audio, query).await
}

/// GET /clipe
pub async fn clipe(State(state): State<SharedState>, query: QueryResult) -> Response {
    relay_media(&state, MediaKind::Video, query).await
}

#[derive(Debug, Serialize)]
struct BestPicks {
    audio: Option<String>,
    video: Option<String>,
}

#[derive(Debug, Serialize)]
struct CatalogReport {
    #[serde(flatten)]
    catalog: FormatCatalog,
    best: BestPicks,
}

/// GET /formats - the normalized catalog and what `best` would pick
pub async fn formats(State(state): State<SharedState>, query: QueryResult) -> Response {
    let example = format!("/formats?url={}", SAMPLE_VIDEO);
    let query = match decode_query(query, example.clone()) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let reference = match state.reference(&query) {
        Ok(reference) => reference,
        Err(err) => return error_response(&err, Some(example)),
    };

    let catalog = match state.orchestrator.catalog(&reference).await {
        Ok(catalog) => catalog,
        Err(err) => return err.into_response(),
    };

    let pick = |kind| {
        FormatSelector::select(catalog.formats(kind), &QualityPolicy::Best).map(|f| f.id.clone())
    };
    let best = BestPicks {
        audio: pick(MediaKind::Audio),
        video: pick(MediaKind::Video),
    };

    Json(CatalogReport { catalog, best }).into_response()
}

/// GET /info
pub async fn info(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "upstream": state.orchestrator.backend_name(),
        "endpoints": {
            "/musica": {
                "method": "GET",
                "description": "Download the audio track of a video",
                "parameters": {
                    "url": "video URL (required)",
                    "quality": "best, worst or a label such as 128kbps (optional, default best)",
                    "format": "exact upstream format id, skips selection and fallback (optional)",
                    "lang": format!("request language (optional, default {})", state.defaults.lang),
                    "country": format!("request country (optional, default {})", state.defaults.country)
                },
                "example": format!("/musica?url={}", SAMPLE_VIDEO)
            },
            "/clipe": {
                "method": "GET",
                "description": "Download a video",
                "parameters": {
                    "url": "video URL (required)",
                    "quality": "best, worst, 720p, 1080p, ... (optional, default best)",
                    "format": "exact upstream format id, skips selection and fallback (optional)",
                    "lang": "request language (optional)",
                    "country": "request country (optional)"
                },
                "example": format!("/clipe?url={}", SAMPLE_VIDEO)
            },
            "/formats": {
                "method": "GET",
                "description": "List the normalized audio/video formats of a video",
                "parameters": { "url": "video URL (required)" },
                "example": format!("/formats?url={}", SAMPLE_VIDEO)
            },
            "/info": { "method": "GET", "description": "This document" }
        },
        "supported_platforms": [
            "YouTube", "TikTok", "Twitter", "Instagram", "Facebook", "Vimeo", "Dailymotion"
        ]
    }))
}

/// GET /
pub async fn root(headers: HeaderMap) -> Json<serde_json::Value> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");

    Json(json!({
        "message": "media-relay is running",
        "endpoints": [
            "GET /musica?url=VIDEO_URL - download audio",
            "GET /clipe?url=VIDEO_URL - download video",
            "GET /formats?url=VIDEO_URL - list formats",
            "GET /info - service description"
        ],
        "examples": {
            "musica": format!("http://{}/musica?url={}", host, SAMPLE_VIDEO),
            "clipe": format!("http://{}/clipe?url={}", host, SAMPLE_VIDEO)
        }
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": "Unknown route, see GET /info",
            "timestamp": timestamp()
        })),
    )
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/info", get(info))
        .route("/musica", get(musica))
        .route("/clipe", get(clipe))
        .route("/formats", get(formats))
        .fallback(not_found)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
