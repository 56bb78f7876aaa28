// Common data models for the relay pipeline

use std::fmt;

use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Default request language when the caller supplies none
pub const DEFAULT_LANG: &str = "pt";
/// Default request country when the caller supplies none
pub const DEFAULT_COUNTRY: &str = "BR";

/// Fallback ids tried in order when no catalog id works (audio)
pub const AUDIO_FORMAT_LADDER: &[&str] = &["251", "140", "139", "bestaudio"];
/// Fallback ids tried in order when no catalog id works (video)
pub const VIDEO_FORMAT_LADDER: &[&str] = &["22", "18", "137", "best"];

/// Kind of media the caller wants back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }

    /// Default ladder of format ids for this kind
    pub fn ladder(&self) -> &'static [&'static str] {
        match self {
            Self::Audio => AUDIO_FORMAT_LADDER,
            Self::Video => VIDEO_FORMAT_LADDER,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The video a request is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaReference {
    pub url: String,
    pub lang: String,
    pub country: String,
}

impl MediaReference {
    /// Reference with the stock `pt`/`BR` locale
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            lang: DEFAULT_LANG.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }

    pub fn with_locale(mut self, lang: Option<&str>, country: Option<&str>) -> Self {
        if let Some(lang) = lang.map(str::trim).filter(|l| !l.is_empty()) {
            self.lang = lang.to_string();
        }
        if let Some(country) = country.map(str::trim).filter(|c| !c.is_empty()) {
            self.country = country.to_string();
        }
        self
    }
}

/// One concrete downloadable variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    /// Upstream-assigned identifier (e.g. "140", "251")
    pub id: String,
    /// Container extension, lowercase, may be empty
    pub extension: String,
    pub media_kind: MediaKind,
    /// Audio bitrate in kbps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<f64>,
    /// Audio sample rate in Hz
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Human label ("720p", "128kbps", "medium")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Direct media link, when the upstream exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl FormatDescriptor {
    pub fn new(id: impl Into<String>, media_kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            extension: String::new(),
            media_kind,
            bitrate: None,
            sample_rate: None,
            width: None,
            height: None,
            note: None,
            file_size: None,
            url: None,
        }
    }
}

/// Canonical audio/video lists built from one metadata document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FormatCatalog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub audio: Vec<FormatDescriptor>,
    pub video: Vec<FormatDescriptor>,
}

impl FormatCatalog {
    pub fn formats(&self, kind: MediaKind) -> &[FormatDescriptor] {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Video => &self.video,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty() && self.video.is_empty()
    }
}

/// How to choose among descriptors
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QualityPolicy {
    #[default]
    Best,
    Worst,
    /// Case-insensitive substring of the descriptor note
    Matching(String),
}

impl QualityPolicy {
    pub fn parse(token: Option<&str>) -> Self {
        let token = token.map(str::trim).unwrap_or("");
        if token.is_empty() || token.eq_ignore_ascii_case("best") {
            Self::Best
        } else if token.eq_ignore_ascii_case("worst") {
            Self::Worst
        } else {
            Self::Matching(token.to_string())
        }
    }
}

impl fmt::Display for QualityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Best => f.write_str("best"),
            Self::Worst => f.write_str("worst"),
            Self::Matching(token) => f.write_str(token),
        }
    }
}

/// Successful upstream download response, body not yet consumed
pub struct UpstreamDownload {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, std::io::Error>>,
}

impl fmt::Debug for UpstreamDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamDownload")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Where the winning format id came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSource {
    Explicit,
    Catalog,
    Ladder,
}

/// Terminal successful attempt of an orchestration run
#[derive(Debug)]
pub struct ResolvedDownload {
    pub format_id: String,
    pub source: FormatSource,
    /// Every id attempted, in order, including the winner
    pub tried: Vec<String>,
    pub download: UpstreamDownload,
}

/// Upstream HTTP settings
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// HTTP or SOCKS5 proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,

    /// Metadata call timeout in seconds
    pub metadata_timeout: u64,

    /// Time allowed for a download attempt to start responding, in seconds
    pub download_timeout: u64,

    /// TCP connect timeout in seconds
    pub connect_timeout: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            metadata_timeout: 30,
            download_timeout: 120,
            connect_timeout: 10,
        }
    }
}
