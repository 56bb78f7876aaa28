// Error types for the relay pipeline

use axum::http::StatusCode;
use thiserror::Error;

/// Failure of a single upstream call (metadata fetch or one download attempt)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Upstream answered, but not with 200
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// Connect or response-header timeout
    #[error("upstream did not respond in time")]
    Timeout,

    /// Connection refused, reset, DNS failure, etc.
    #[error("transport error: {0}")]
    Transport(String),
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout;
        }

        if let Some(status) = e.status() {
            return Self::Status(status.as_u16());
        }

        Self::Transport(e.to_string())
    }
}

/// Terminal failure of one relay request, surfaced to the caller
#[derive(Debug, Error)]
pub enum RelayError {
    /// No URL supplied; rejected before any network call
    #[error("a media URL is required")]
    MissingReference,

    /// Query string could not be decoded
    #[error("invalid query string: {0}")]
    InvalidQuery(String),

    /// Metadata call timed out, failed in transport or returned non-200
    #[error("could not fetch media metadata: {cause}")]
    MetadataUnavailable { cause: UpstreamError },

    /// Catalog had nothing for the requested kind and the ladder exhausted
    #[error("no {kind} formats available (tried {})", .tried.join(", "))]
    NoFormatsFound {
        kind: &'static str,
        tried: Vec<String>,
        cause: Option<UpstreamError>,
    },

    /// Caller asked for a specific format id and it failed
    #[error("format '{format_id}' was rejected upstream: {cause}")]
    ExplicitFormatRejected {
        format_id: String,
        cause: UpstreamError,
    },

    /// Catalog-selected id and every ladder id failed
    #[error("download failed for every format tried ({}): {cause}", .tried.join(", "))]
    DownloadFailed {
        tried: Vec<String>,
        cause: UpstreamError,
    },

    /// Ladder exhausted and the final attempt timed out
    #[error("upstream timed out after trying {}", .tried.join(", "))]
    UpstreamTimeout { tried: Vec<String> },

    /// Local failure (client construction and the like)
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingReference => "MissingReference",
            Self::InvalidQuery(_) => "InvalidQuery",
            Self::MetadataUnavailable { .. } => "MetadataUnavailable",
            Self::NoFormatsFound { .. } => "NoFormatsFound",
            Self::ExplicitFormatRejected { .. } => "ExplicitFormatRejected",
            Self::DownloadFailed { .. } => "DownloadFailed",
            Self::UpstreamTimeout { .. } => "UpstreamTimeout",
            Self::Internal(_) => "Internal",
        }
    }

    /// HTTP status the caller sees
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingReference | Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::MetadataUnavailable { cause } => match cause {
                UpstreamError::Status(code) => {
                    StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                UpstreamError::Timeout => StatusCode::REQUEST_TIMEOUT,
                UpstreamError::Transport(_) => StatusCode::BAD_GATEWAY,
            },
            Self::NoFormatsFound { .. } => StatusCode::NOT_FOUND,
            Self::ExplicitFormatRejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DownloadFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Format ids attempted before giving up
    pub fn tried_formats(&self) -> Option<&[String]> {
        match self {
            Self::NoFormatsFound { tried, .. }
            | Self::DownloadFailed { tried, .. }
            | Self::UpstreamTimeout { tried } => Some(tried),
            Self::ExplicitFormatRejected { format_id, .. } => Some(std::slice::from_ref(format_id)),
            _ => None,
        }
    }

    /// What the caller can do about it
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::MissingReference => Some("Pass the video URL in the \"url\" query parameter"),
            Self::InvalidQuery(_) => Some("Pass each parameter once, URL-encoded"),
            Self::ExplicitFormatRejected { .. } => {
                Some("Retry without \"format\" to let the service pick a working format")
            }
            Self::MetadataUnavailable { cause } if cause.is_timeout() => {
                Some("The metadata service is slow right now, try again later")
            }
            Self::UpstreamTimeout { .. } => Some("The download service is slow right now, try again later"),
            Self::NoFormatsFound { .. } => Some("Check that the URL points to a single public video"),
            Self::DownloadFailed { .. } => Some("Try a different quality or try again later"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_status_passthrough() {
        let err = RelayError::MetadataUnavailable {
            cause: UpstreamError::Status(403),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let err = RelayError::MetadataUnavailable {
            cause: UpstreamError::Timeout,
        };
        assert_eq!(err.status_code(), StatusCode::REQUEST_TIMEOUT);
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn test_invalid_query_is_bad_request() {
        let err = RelayError::InvalidQuery("duplicate field `url`".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "InvalidQuery");
        assert!(err.tried_formats().is_none());
    }

    #[test]
    fn test_tried_formats_reported() {
        let err = RelayError::DownloadFailed {
            tried: vec!["140".to_string(), "251".to_string()],
            cause: UpstreamError::Status(500),
        };
        assert_eq!(err.tried_formats().unwrap().len(), 2);
        assert!(err.to_string().contains("140, 251"));

        let err = RelayError::ExplicitFormatRejected {
            format_id: "999".to_string(),
            cause: UpstreamError::Status(404),
        };
        assert_eq!(err.tried_formats().unwrap(), ["999".to_string()]);
        assert_eq!(err.kind(), "ExplicitFormatRejected");
    }
}
