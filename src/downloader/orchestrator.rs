// Orchestrator with fallback logic
//
// One metadata fetch, then sequential download attempts:
// explicit id (no fallback) | catalog-selected id, then the default ladder.

use std::sync::Arc;

use super::errors::{RelayError, UpstreamError};
use super::extractors;
use super::format_selector::FormatSelector;
use super::models::{
    FormatCatalog, FormatSource, MediaKind, MediaReference, QualityPolicy, ResolvedDownload,
    UpstreamDownload,
};
use super::traits::UpstreamBackend;

pub struct Orchestrator {
    backend: Arc<dyn UpstreamBackend>,
    audio_ladder: Vec<String>,
    video_ladder: Vec<String>,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn UpstreamBackend>) -> Self {
        Self {
            backend,
            audio_ladder: to_owned(MediaKind::Audio.ladder()),
            video_ladder: to_owned(MediaKind::Video.ladder()),
        }
    }

    /// Replace the fallback ladder for one kind
    pub fn with_ladder(mut self, kind: MediaKind, ids: &[&str]) -> Self {
        match kind {
            MediaKind::Audio => self.audio_ladder = to_owned(ids),
            MediaKind::Video => self.video_ladder = to_owned(ids),
        }
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn ladder(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Audio => &self.audio_ladder,
            MediaKind::Video => &self.video_ladder,
        }
    }

    /// Fetch and normalize metadata
    pub async fn catalog(&self, reference: &MediaReference) -> Result<FormatCatalog, RelayError> {
        tracing::debug!("[Orchestrator] Fetching metadata via {}", self.backend.name());

        let raw = self
            .backend
            .fetch_metadata(reference)
            .await
            .map_err(|cause| {
                tracing::warn!("[Orchestrator] ✗ Metadata fetch failed: {}", cause);
                RelayError::MetadataUnavailable { cause }
            })?;

        let catalog = extractors::normalize(&raw);
        tracing::info!(
            "[Orchestrator] Catalog: {} audio, {} video",
            catalog.audio.len(),
            catalog.video.len()
        );
        Ok(catalog)
    }

    /// Resolve a format id and start its download, falling back along the ladder
    pub async fn resolve_and_download(
        &self,
        reference: &MediaReference,
        kind: MediaKind,
        explicit_format: Option<&str>,
        policy: &QualityPolicy,
    ) -> Result<ResolvedDownload, RelayError> {
        let mut tried: Vec<String> = Vec::new();

        if let Some(format_id) = explicit_format.map(str::trim).filter(|f| !f.is_empty()) {
            tracing::info!("[Orchestrator] Explicit format requested: {}", format_id);
            return match self.attempt(reference, format_id, &mut tried).await {
                Ok(download) => Ok(ResolvedDownload {
                    format_id: format_id.to_string(),
                    source: FormatSource::Explicit,
                    tried,
                    download,
                }),
                // a slow upstream says nothing about the id itself
                Err(UpstreamError::Timeout) => Err(RelayError::UpstreamTimeout { tried }),
                Err(cause) => Err(RelayError::ExplicitFormatRejected {
                    format_id: format_id.to_string(),
                    cause,
                }),
            };
        }

        let catalog = self.catalog(reference).await?;
        let selected = FormatSelector::select(catalog.formats(kind), policy).map(|f| f.id.clone());

        let mut last_error: Option<UpstreamError> = None;

        match &selected {
            Some(format_id) => {
                tracing::info!("[Orchestrator] Selected {} format {} ({})", kind, format_id, policy);
                match self.attempt(reference, format_id, &mut tried).await {
                    Ok(download) => {
                        return Ok(ResolvedDownload {
                            format_id: format_id.clone(),
                            source: FormatSource::Catalog,
                            tried,
                            download,
                        })
                    }
                    Err(e) => last_error = Some(e),
                }
            }
            None => {
                tracing::info!("[Orchestrator] No {} formats in catalog, using fallback ladder", kind);
            }
        }

        for format_id in self.ladder(kind) {
            if tried.contains(format_id) {
                continue;
            }

            match self.attempt(reference, format_id, &mut tried).await {
                Ok(download) => {
                    return Ok(ResolvedDownload {
                        format_id: format_id.clone(),
                        source: FormatSource::Ladder,
                        tried,
                        download,
                    })
                }
                Err(e) => last_error = Some(e),
            }
        }

        tracing::error!(
            "[Orchestrator] All formats failed for {}: {}",
            kind,
            tried.join(", ")
        );

        Err(match (selected, last_error) {
            (_, Some(UpstreamError::Timeout)) => RelayError::UpstreamTimeout { tried },
            (Some(_), Some(cause)) => RelayError::DownloadFailed { tried, cause },
            (_, cause) => RelayError::NoFormatsFound {
                kind: kind.as_str(),
                tried,
                cause,
            },
        })
    }

    async fn attempt(
        &self,
        reference: &MediaReference,
        format_id: &str,
        tried: &mut Vec<String>,
    ) -> Result<UpstreamDownload, UpstreamError> {
        tracing::info!("[Orchestrator] Trying format {} with {}", format_id, self.backend.name());
        tried.push(format_id.to_string());

        match self.backend.download(reference, format_id).await {
            Ok(download) => {
                tracing::info!("[Orchestrator] ✓ Format {} accepted", format_id);
                Ok(download)
            }
            Err(e) => {
                tracing::warn!("[Orchestrator] ✗ Format {} failed: {}", format_id, e);
                Err(e)
            }
        }
    }
}

fn to_owned(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}
