use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::{ApiError, ApiException, ErrorBody, ErrorCode, GENERIC_ERROR_MESSAGE},
    protocol::UploadResponse,
};
use tracing::{info, warn};
use url::Url;

use crate::api::{parse_base_url, ApiResult, SharedToken};

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Stores a file and hands back its public URL.
#[async_trait]
pub trait UploadProvider: Send + Sync {
    async fn upload(&self, file: FileUpload) -> ApiResult<String>;
}

pub struct HttpUploadProvider {
    http: Client,
    endpoint: Url,
    token: SharedToken,
}

impl HttpUploadProvider {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let endpoint = parse_base_url(base_url)?.join("uploads")?;
        Ok(Self {
            http,
            endpoint,
            token: SharedToken::default(),
        })
    }

    /// Authenticates uploads with the token the API client holds.
    pub fn with_token(mut self, token: SharedToken) -> Self {
        self.token = token;
        self
    }
}

#[async_trait]
impl UploadProvider for HttpUploadProvider {
    async fn upload(&self, file: FileUpload) -> ApiResult<String> {
        let size_bytes = file.bytes.len();
        let content_type = file
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .query(&[("filename", file.filename.as_str())])
            .header(reqwest::header::CONTENT_TYPE, content_type);
        if let Some(token) = self.token.read().await.as_deref() {
            builder = builder.bearer_auth(token);
        }
        let response = builder
            .body(file.bytes)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "upload: transport failure");
                ApiException::new(ErrorCode::Transport, GENERIC_ERROR_MESSAGE)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.ok();
            return Err(ApiError::from_body(ErrorCode::from_status(status.as_u16()), body).into());
        }

        let body: UploadResponse = response.json().await.map_err(|err| {
            warn!(error = %err, "upload: malformed response body");
            ApiException::new(ErrorCode::Internal, GENERIC_ERROR_MESSAGE)
        })?;
        info!(filename = %file.filename, size_bytes, url = %body.url, "upload: stored file");
        Ok(body.url)
    }
}
