// Helper functions for backend implementations

use std::time::Duration;

use crate::downloader::models::NetworkConfig;

/// Build the shared HTTP client. Only the configured proxy is used;
/// `HTTP_PROXY`-style variables are ignored.
pub fn build_http_client(config: &NetworkConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout))
        .user_agent(concat!("media-relay/", env!("CARGO_PKG_VERSION")));

    if let Some(proxy_url) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        tracing::info!("[Network] Using proxy: {}", proxy_url);
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    } else {
        tracing::debug!("[Network] Direct connection");
        builder = builder.no_proxy();
    }

    builder.build()
}

/// Fresh device identifier: a v4 UUID without dashes
pub fn device_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Join an endpoint path onto a base URL, tolerating a trailing slash
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
