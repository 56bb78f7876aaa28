// any4k backend - JSON-over-HTTP metadata and download service
//
// POST {base}/check    -> metadata document
// POST {base}/download -> raw media bytes for one format id

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;

use crate::downloader::errors::UpstreamError;
use crate::downloader::models::{MediaReference, NetworkConfig, UpstreamDownload};
use crate::downloader::traits::UpstreamBackend;
use crate::downloader::utils;

pub const DEFAULT_BASE_URL: &str = "https://api.any4k.com/v1/dlp";

/// How the relay presents itself to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub platform: String,
    pub sys_version: String,
    pub app_version: String,
    pub bundle_id: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            platform: "Web".to_string(),
            sys_version: "1.0.0".to_string(),
            app_version: "1.0.0".to_string(),
            bundle_id: "com.any4k.api".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest<'a> {
    url: &'a str,
    lang: &'a str,
    country: &'a str,
    platform: &'a str,
    device_id: String,
    sys_ver: &'a str,
    app_ver: &'a str,
    bundle_id: &'a str,
}

#[derive(Debug, Serialize)]
struct DownloadRequest<'a> {
    url: &'a str,
    format: &'a str,
    lang: &'a str,
    country: &'a str,
}

pub struct Any4kBackend {
    client: reqwest::Client,
    base_url: String,
    identity: ClientIdentity,
    metadata_timeout: Duration,
    download_timeout: Duration,
}

impl Any4kBackend {
    pub fn new(
        base_url: impl Into<String>,
        identity: ClientIdentity,
        network: &NetworkConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: utils::build_http_client(network)?,
            base_url: base_url.into(),
            identity,
            metadata_timeout: Duration::from_secs(network.metadata_timeout),
            download_timeout: Duration::from_secs(network.download_timeout),
        })
    }

    fn check_request<'a>(&'a self, reference: &'a MediaReference) -> CheckRequest<'a> {
        CheckRequest {
            url: &reference.url,
            lang: &reference.lang,
            country: &reference.country,
            platform: &self.identity.platform,
            device_id: utils::device_id(),
            sys_ver: &self.identity.sys_version,
            app_ver: &self.identity.app_version,
            bundle_id: &self.identity.bundle_id,
        }
    }
}

#[async_trait]
impl UpstreamBackend for Any4kBackend {
    fn name(&self) -> &'static str {
        "any4k"
    }

    async fn fetch_metadata(&self, reference: &MediaReference) -> Result<Value, UpstreamError> {
        let url = utils::endpoint(&self.base_url, "check");
        tracing::info!("[any4k] Checking {}", reference.url);

        let response = self
            .client
            .post(&url)
            .json(&self.check_request(reference))
            .timeout(self.metadata_timeout)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!("[any4k] /check returned {}", status);
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        match serde_json::from_slice::<Value>(&body) {
            Ok(document) => Ok(document),
            Err(e) => {
                tracing::warn!("[any4k] /check body is not JSON ({}), treating as empty", e);
                Ok(Value::Null)
            }
        }
    }

    async fn download(
        &self,
        reference: &MediaReference,
        format_id: &str,
    ) -> Result<UpstreamDownload, UpstreamError> {
        let url = utils::endpoint(&self.base_url, "download");
        let request = self.client.post(&url).json(&DownloadRequest {
            url: &reference.url,
            format: format_id,
            lang: &reference.lang,
            country: &reference.country,
        });

        // Bounds the wait for response headers only; the body may take as long as it needs
        let response = tokio::time::timeout(self.download_timeout, request.send())
            .await
            .map_err(|_| {
                tracing::warn!(
                    "[any4k] /download {} timed out after {}s",
                    format_id,
                    self.download_timeout.as_secs()
                );
                UpstreamError::Timeout
            })??;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();

        tracing::debug!(
            "[any4k] /download {} -> {:?}, {:?} bytes",
            format_id,
            content_type,
            content_length
        );

        Ok(UpstreamDownload {
            content_type,
            content_length,
            body: response.bytes_stream().map_err(std::io::Error::other).boxed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-connection upstream: reads the request, then writes `reply`
    /// verbatim, or holds the socket open without answering when None.
    async fn scripted_upstream(reply: Option<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let _ = socket.read(&mut buf).await;

            match reply {
                Some(reply) => {
                    let _ = socket.write_all(reply.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
                None => tokio::time::sleep(Duration::from_secs(30)).await,
            }
        });

        format!("http://{}", addr)
    }

    fn backend_at(base_url: String) -> Any4kBackend {
        let network = NetworkConfig {
            connect_timeout: 2,
            metadata_timeout: 5,
            download_timeout: 1,
            ..NetworkConfig::default()
        };
        Any4kBackend::new(base_url, ClientIdentity::default(), &network).unwrap()
    }

    fn reference() -> MediaReference {
        MediaReference::new("https://youtu.be/abc")
    }

    #[tokio::test]
    async fn test_check_requires_exactly_200() {
        let base = scripted_upstream(Some("HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n")).await;

        let err = backend_at(base).fetch_metadata(&reference()).await.unwrap_err();
        assert_eq!(err, UpstreamError::Status(204));
    }

    #[tokio::test]
    async fn test_check_non_json_body_is_null() {
        let base = scripted_upstream(Some(
            "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: 9\r\nconnection: close\r\n\r\n<html/>!!",
        ))
        .await;

        let document = backend_at(base).fetch_metadata(&reference()).await.unwrap();
        assert_eq!(document, Value::Null);
    }

    #[tokio::test]
    async fn test_download_without_headers_times_out() {
        let base = scripted_upstream(None).await;

        let err = backend_at(base).download(&reference(), "140").await.unwrap_err();
        assert_eq!(err, UpstreamError::Timeout);
    }

    #[tokio::test]
    async fn test_download_error_status() {
        let base = scripted_upstream(Some(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        ))
        .await;

        let err = backend_at(base).download(&reference(), "251").await.unwrap_err();
        assert_eq!(err, UpstreamError::Status(503));
    }

    #[tokio::test]
    async fn test_download_streams_body_with_headers() {
        let base = scripted_upstream(Some(
            "HTTP/1.1 200 OK\r\ncontent-type: audio/mp4\r\ncontent-length: 5\r\nconnection: close\r\n\r\nhello",
        ))
        .await;

        let download = backend_at(base).download(&reference(), "140").await.unwrap();
        assert_eq!(download.content_type.as_deref(), Some("audio/mp4"));
        assert_eq!(download.content_length, Some(5));

        let chunks: Vec<_> = download.body.try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"hello");
    }

    fn backend() -> Any4kBackend {
        Any4kBackend::new(DEFAULT_BASE_URL, ClientIdentity::default(), &NetworkConfig::default())
            .unwrap()
    }

    #[test]
    fn test_check_payload() {
        let backend = backend();
        let reference = MediaReference::new("https://youtu.be/abc");
        let payload = serde_json::to_value(backend.check_request(&reference)).unwrap();

        assert_eq!(payload["url"], "https://youtu.be/abc");
        assert_eq!(payload["lang"], "pt");
        assert_eq!(payload["country"], "BR");
        assert_eq!(payload["platform"], "Web");
        assert_eq!(payload["sysVer"], "1.0.0");
        assert_eq!(payload["appVer"], "1.0.0");
        assert_eq!(payload["bundleId"], "com.any4k.api");
        assert_eq!(payload["deviceId"].as_str().map(str::len), Some(32));
    }

    #[test]
    fn test_download_payload() {
        let payload = serde_json::to_value(DownloadRequest {
            url: "https://youtu.be/abc",
            format: "140",
            lang: "en",
            country: "US",
        })
        .unwrap();

        assert_eq!(
            payload,
            serde_json::json!({
                "url": "https://youtu.be/abc",
                "format": "140",
                "lang": "en",
                "country": "US"
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        // nothing listens on port 9 locally
        let network = NetworkConfig {
            connect_timeout: 2,
            metadata_timeout: 5,
            ..NetworkConfig::default()
        };
        let backend =
            Any4kBackend::new("http://127.0.0.1:9", ClientIdentity::default(), &network).unwrap();

        let err = backend
            .fetch_metadata(&MediaReference::new("https://youtu.be/abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_) | UpstreamError::Timeout));
    }
}
