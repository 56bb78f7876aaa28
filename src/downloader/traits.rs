// Upstream backend trait definition

use async_trait::async_trait;

use super::errors::UpstreamError;
use super::models::{MediaReference, UpstreamDownload};

/// The black-box metadata/download service
#[async_trait]
pub trait UpstreamBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// Fetch the raw metadata document for a reference.
    ///
    /// A 200 whose body is not JSON yields `Value::Null`; shape problems are
    /// left to the normalizer.
    async fn fetch_metadata(
        &self,
        reference: &MediaReference,
    ) -> Result<serde_json::Value, UpstreamError>;

    /// Start one download for one format id. Resolves once response headers
    /// are in; the body is streamed by the caller.
    async fn download(
        &self,
        reference: &MediaReference,
        format_id: &str,
    ) -> Result<UpstreamDownload, UpstreamError>;
}
