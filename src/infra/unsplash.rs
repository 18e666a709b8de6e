use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Url};
use serde_json::Value;

use crate::config::AppConfig;
use crate::domain::image::ImageId;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream responded with status {status}")]
    Status { status: u16 },
    #[error("invalid upstream url: {0}")]
    Url(#[from] url::ParseError),
}

/// The third-party photo API: read access for the gallery proxy and the
/// like endpoints used as a best-effort mirror of the local ledger.
#[async_trait]
pub trait PhotoProvider: Send + Sync {
    async fn list_photos(&self, page: u32, per_page: u32) -> Result<Value, UpstreamError>;

    async fn search_photos(&self, query: &str, page: u32) -> Result<Value, UpstreamError>;

    async fn get_photo(&self, id: &ImageId) -> Result<Value, UpstreamError>;

    async fn like_photo(&self, id: &ImageId) -> Result<(), UpstreamError>;

    async fn unlike_photo(&self, id: &ImageId) -> Result<(), UpstreamError>;
}

#[derive(Clone)]
pub struct UnsplashClient {
    http: reqwest::Client,
    base_url: Url,
}

impl UnsplashClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.unsplash_api_url)
            .map_err(|err| anyhow!("invalid UNSPLASH_API_URL: {}", err))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut auth = HeaderValue::from_str(&format!("Client-ID {}", config.unsplash_access_key))
            .map_err(|err| anyhow!("invalid UNSPLASH_ACCESS_KEY: {}", err))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Accept-Version", HeaderValue::from_static("v1"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.upstream_timeout_seconds))
            .build()?;

        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> Result<Url, UpstreamError> {
        Ok(self.base_url.join(path)?)
    }

    async fn fetch_json(&self, url: Url) -> Result<Value, UpstreamError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.json::<Value>().await?)
    }

    async fn send_like(&self, method: Method, id: &ImageId) -> Result<(), UpstreamError> {
        let url = self.url(&format!("photos/{}/like", id))?;
        let response = self.http.request(method, url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PhotoProvider for UnsplashClient {
    async fn list_photos(&self, page: u32, per_page: u32) -> Result<Value, UpstreamError> {
        let mut url = self.url("photos")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());
        self.fetch_json(url).await
    }

    async fn search_photos(&self, query: &str, page: u32) -> Result<Value, UpstreamError> {
        let mut url = self.url("search/photos")?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("page", &page.to_string())
            .append_pair("per_page", "10");
        self.fetch_json(url).await
    }

    async fn get_photo(&self, id: &ImageId) -> Result<Value, UpstreamError> {
        let url = self.url(&format!("photos/{}", id))?;
        self.fetch_json(url).await
    }

    async fn like_photo(&self, id: &ImageId) -> Result<(), UpstreamError> {
        self.send_like(Method::POST, id).await
    }

    async fn unlike_photo(&self, id: &ImageId) -> Result<(), UpstreamError> {
        self.send_like(Method::DELETE, id).await
    }
}
