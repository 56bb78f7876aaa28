// Streaming response emitter - relays an upstream download to the caller

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;

use super::errors::RelayError;
use super::models::{MediaKind, UpstreamDownload};

const AUDIO_EXTENSIONS: &[(&str, &str)] = &[
    ("audio/mpeg", "mp3"),
    ("audio/mp4", "m4a"),
    ("audio/m4a", "m4a"),
    ("audio/webm", "webm"),
    ("audio/ogg", "ogg"),
    ("audio/opus", "opus"),
];

const VIDEO_EXTENSIONS: &[(&str, &str)] = &[
    ("video/mp4", "mp4"),
    ("video/webm", "webm"),
    ("video/avi", "avi"),
    ("video/x-msvideo", "avi"),
    ("video/x-matroska", "mkv"),
];

/// File extension for a declared content type
pub fn extension_for(kind: MediaKind, content_type: Option<&str>) -> &'static str {
    let (table, fallback) = match kind {
        MediaKind::Audio => (AUDIO_EXTENSIONS, "m4a"),
        MediaKind::Video => (VIDEO_EXTENSIONS, "mp4"),
    };

    let Some(content_type) = content_type.map(str::to_ascii_lowercase) else {
        return fallback;
    };

    table
        .iter()
        .find(|(mime, _)| content_type.contains(mime))
        .map_or(fallback, |(_, ext)| *ext)
}

/// MIME type sent when the upstream declares none
pub fn default_mime(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Audio => "audio/mpeg",
        MediaKind::Video => "video/mp4",
    }
}

/// `musica_<id>.<ext>` or `clipe_<id>.<ext>`
pub fn filename(kind: MediaKind, format_id: &str, extension: &str) -> String {
    let prefix = match kind {
        MediaKind::Audio => "musica",
        MediaKind::Video => "clipe",
    };

    let mut id: String = format_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if id.is_empty() {
        id.push_str("media");
    }

    format!("{}_{}.{}", prefix, id, extension)
}

/// Build the streaming response. The body is forwarded chunk by chunk;
/// dropping the response drops the upstream stream with it.
pub fn emit(kind: MediaKind, format_id: &str, download: UpstreamDownload) -> Response {
    let content_type = download
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static(default_mime(kind)));

    let name = filename(
        kind,
        format_id,
        extension_for(kind, download.content_type.as_deref()),
    );

    tracing::info!(
        "[Emitter] Streaming {} ({:?}, {} bytes declared)",
        name,
        content_type,
        download
            .content_length
            .map_or_else(|| "unknown".to_string(), |n| n.to_string())
    );

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        );

    if let Some(length) = download.content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    let relay_name = name.clone();
    let stream = download.body.inspect_err(move |e| {
        tracing::warn!("[Emitter] Upstream stream for {} broke off: {}", relay_name, e);
    });

    match builder.body(Body::from_stream(stream)) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("[Emitter] Failed to build response for {}: {}", name, e);
            RelayError::Internal(format!("failed to build response: {}", e)).into_response()
        }
    }
}
