//! Remote workforce API.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{User, UserId},
    error::{ApiError, ApiException, ErrorBody, ErrorCode, GENERIC_ERROR_MESSAGE},
    protocol::{
        AssignRoleRequest, ClockInRequest, CreateReportRequest, CreateTicketRequest,
        LoginRequest, PermissionRequest, RegisterRequest, ReportCreated, Session, TicketCreated,
        UpdateUserRequest,
    },
};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

pub type ApiResult<T> = std::result::Result<T, ApiException>;

/// Bearer token shared between the API client and the upload provider.
pub type SharedToken = Arc<RwLock<Option<String>>>;

#[async_trait]
pub trait WorkforceApi: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> ApiResult<User>;
    async fn login(&self, request: &LoginRequest) -> ApiResult<Session>;
    async fn fetch_profile(&self) -> ApiResult<User>;
    async fn update_user(&self, user_id: UserId, request: &UpdateUserRequest) -> ApiResult<User>;
    async fn assign_role(&self, request: &AssignRoleRequest) -> ApiResult<User>;
    async fn create_report(&self, request: &CreateReportRequest) -> ApiResult<ReportCreated>;
    async fn create_ticket(&self, request: &CreateTicketRequest) -> ApiResult<TicketCreated>;
    async fn request_permission(&self, request: &PermissionRequest) -> ApiResult<()>;
    async fn clock_in(&self, request: &ClockInRequest) -> ApiResult<()>;
    /// Token attached to authenticated calls; `None` signs out.
    async fn set_token(&self, token: Option<String>);
}

pub struct HttpWorkforceApi {
    http: Client,
    base_url: Url,
    token: SharedToken,
}

impl HttpWorkforceApi {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, parse_base_url(base_url)?))
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: SharedToken::default(),
        }
    }

    pub fn token_handle(&self) -> SharedToken {
        Arc::clone(&self.token)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let url = self.base_url.join(path).map_err(|err| {
            ApiException::new(ErrorCode::Internal, format!("invalid endpoint {path}: {err}"))
        })?;
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.token.read().await.as_deref() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorBody>().await.ok();
            let err = ApiError::from_body(ErrorCode::from_status(status.as_u16()), body);
            debug!(status = status.as_u16(), message = %err.message, "api: request rejected");
            return Err(err.into());
        }
        response.json::<T>().await.map_err(|err| {
            warn!(error = %err, "api: malformed response body");
            ApiException::new(ErrorCode::Internal, GENERIC_ERROR_MESSAGE)
        })
    }

    async fn send_empty(&self, builder: RequestBuilder) -> ApiResult<()> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.json::<ErrorBody>().await.ok();
        Err(ApiError::from_body(ErrorCode::from_status(status.as_u16()), body).into())
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let builder = self.request(Method::POST, path).await?.json(body);
        self.send(builder).await
    }
}

/// Parses a base url and makes sure relative joins keep its path.
pub fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("api base url must start with http:// or https://, got '{raw}'");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn transport_error(err: reqwest::Error) -> ApiException {
    warn!(error = %err, "api: transport failure");
    ApiException::new(ErrorCode::Transport, GENERIC_ERROR_MESSAGE)
}

#[async_trait]
impl WorkforceApi for HttpWorkforceApi {
    async fn register(&self, request: &RegisterRequest) -> ApiResult<User> {
        self.post("auth/register", request).await
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<Session> {
        self.post("auth/login", request).await
    }

    async fn fetch_profile(&self) -> ApiResult<User> {
        let builder = self.request(Method::GET, "users/me").await?;
        self.send(builder).await
    }

    async fn update_user(&self, user_id: UserId, request: &UpdateUserRequest) -> ApiResult<User> {
        let builder = self
            .request(Method::PATCH, &format!("users/{}", user_id.0))
            .await?
            .json(request);
        self.send(builder).await
    }

    async fn assign_role(&self, request: &AssignRoleRequest) -> ApiResult<User> {
        self.post("users/assign-role", request).await
    }

    async fn create_report(&self, request: &CreateReportRequest) -> ApiResult<ReportCreated> {
        self.post("reports", request).await
    }

    async fn create_ticket(&self, request: &CreateTicketRequest) -> ApiResult<TicketCreated> {
        self.post("tickets", request).await
    }

    async fn request_permission(&self, request: &PermissionRequest) -> ApiResult<()> {
        let builder = self.request(Method::POST, "permissions").await?.json(request);
        self.send_empty(builder).await
    }

    async fn clock_in(&self, request: &ClockInRequest) -> ApiResult<()> {
        let builder = self
            .request(Method::POST, "attendance/clock-in")
            .await?
            .json(request);
        self.send_empty(builder).await
    }

    async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
