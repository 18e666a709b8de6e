use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Deserialize;

use crate::domain::image::ImageId;
use crate::domain::like::LikeStatus;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
    #[error("{message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Server operations the like controller depends on.
#[async_trait]
pub trait LikeApi: Send + Sync {
    async fn get_like_status(
        &self,
        image_id: &ImageId,
        token: Option<&str>,
    ) -> Result<LikeStatus, ApiError>;

    async fn like_image(&self, image_id: &ImageId, token: &str) -> Result<LikeStatus, ApiError>;

    async fn unlike_image(&self, image_id: &ImageId, token: &str) -> Result<LikeStatus, ApiError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct HttpLikeApi {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpLikeApi {
    /// `base_url` points at the API root, e.g. `http://localhost:8080/api`.
    pub fn new(mut base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<LikeStatus, ApiError> {
        let url = self.base_url.join(path)?;
        let mut request = self.http.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<LikeStatus>().await?);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl LikeApi for HttpLikeApi {
    async fn get_like_status(
        &self,
        image_id: &ImageId,
        token: Option<&str>,
    ) -> Result<LikeStatus, ApiError> {
        self.send(Method::GET, &format!("images/{}/likes", image_id), token)
            .await
    }

    async fn like_image(&self, image_id: &ImageId, token: &str) -> Result<LikeStatus, ApiError> {
        self.send(Method::POST, &format!("images/{}/like", image_id), Some(token))
            .await
    }

    async fn unlike_image(&self, image_id: &ImageId, token: &str) -> Result<LikeStatus, ApiError> {
        self.send(Method::DELETE, &format!("images/{}/like", image_id), Some(token))
            .await
    }
}
