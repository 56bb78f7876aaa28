// Scripted in-memory upstream for tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;

use super::errors::UpstreamError;
use super::models::{MediaReference, UpstreamDownload};
use super::traits::UpstreamBackend;

/// Fixed metadata, per-id download failures; every other id succeeds with
/// a one-chunk body holding the id itself.
pub struct FakeBackend {
    metadata: Result<Value, UpstreamError>,
    outcomes: HashMap<String, UpstreamError>,
    content_type: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(metadata: Result<Value, UpstreamError>) -> Self {
        Self {
            metadata,
            outcomes: HashMap::new(),
            content_type: Some("audio/mp4".to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, id: &str, error: UpstreamError) -> Self {
        self.outcomes.insert(id.to_string(), error);
        self
    }

    pub fn content_type(mut self, content_type: Option<&str>) -> Self {
        self.content_type = content_type.map(str::to_string);
        self
    }

    /// Upstream calls in order: "check" for metadata, the format id for downloads
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamBackend for FakeBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_metadata(&self, _: &MediaReference) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push("check".to_string());
        self.metadata.clone()
    }

    async fn download(
        &self,
        _: &MediaReference,
        format_id: &str,
    ) -> Result<UpstreamDownload, UpstreamError> {
        self.calls.lock().unwrap().push(format_id.to_string());
        if let Some(error) = self.outcomes.get(format_id) {
            return Err(error.clone());
        }

        let chunk = Bytes::from(format_id.to_string());
        Ok(UpstreamDownload {
            content_type: self.content_type.clone(),
            content_length: Some(chunk.len() as u64),
            body: futures::stream::iter(vec![Ok(chunk)]).boxed(),
        })
    }
}
