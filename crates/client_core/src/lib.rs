use std::sync::Arc;

use anyhow::{Context, Result};
use shared::{
    domain::User,
    error::ErrorCode,
    protocol::{LoginRequest, Session},
};
use storage::Storage;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub mod access;
pub mod api;
pub mod config;
pub mod forms;
pub mod navigation;
pub mod notice;
pub mod registration;
pub mod routes;
pub mod session;
pub mod upload;
pub mod validation;
pub mod wizard;

pub use access::{can_access, Permissions};
pub use api::{HttpWorkforceApi, WorkforceApi};
pub use config::{load_settings, ClientSettings};
pub use forms::ScreenOutcome;
pub use navigation::{NavParams, Navigator, RouteNavigator};
pub use notice::Notice;
pub use registration::{registration_form, RegistrationFlow, SubmitError};
pub use routes::{workforce_routes, MenuEntry, RouteTree};
pub use session::{MemorySessionStore, SessionStore};
pub use upload::{FileUpload, HttpUploadProvider, UploadProvider};
pub use validation::{FieldErrors, FormValues};
pub use wizard::{MultiStepForm, WizardError, WizardPhase};

use crate::{forms::login_schema, routes::names};

/// Session-scoped state shared by every screen: who is signed in, what they
/// may see, and where they are.
pub struct WorkforceClient {
    api: Arc<dyn WorkforceApi>,
    uploader: Arc<dyn UploadProvider>,
    sessions: Arc<dyn SessionStore>,
    navigator: Arc<RouteNavigator>,
    session: RwLock<Option<Session>>,
}

impl WorkforceClient {
    pub fn new(
        api: Arc<dyn WorkforceApi>,
        uploader: Arc<dyn UploadProvider>,
        sessions: Arc<dyn SessionStore>,
        routes: RouteTree,
    ) -> Self {
        Self {
            api,
            uploader,
            sessions,
            navigator: Arc::new(RouteNavigator::new(routes)),
            session: RwLock::new(None),
        }
    }

    /// HTTP API, an upload provider on the same token, and a sqlite-backed
    /// session store.
    pub async fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let api = HttpWorkforceApi::new(&settings.api_base_url, settings.request_timeout())
            .context("failed to build api client")?;
        let uploader =
            HttpUploadProvider::new(&settings.api_base_url, settings.request_timeout())
                .context("failed to build upload client")?
                .with_token(api.token_handle());
        let storage = Storage::new(&settings.session_database_url)
            .await
            .with_context(|| {
                format!(
                    "failed to open session store '{}'",
                    settings.session_database_url
                )
            })?;
        Ok(Self::new(
            Arc::new(api),
            Arc::new(uploader),
            Arc::new(storage),
            workforce_routes(),
        ))
    }

    pub fn api(&self) -> Arc<dyn WorkforceApi> {
        Arc::clone(&self.api)
    }

    pub fn uploader(&self) -> Arc<dyn UploadProvider> {
        Arc::clone(&self.uploader)
    }

    pub fn navigator(&self) -> Arc<RouteNavigator> {
        Arc::clone(&self.navigator)
    }

    pub fn registration_flow(&self) -> RegistrationFlow {
        RegistrationFlow::new(
            Arc::clone(&self.api),
            Arc::clone(&self.sessions),
            self.navigator.clone(),
        )
    }

    pub async fn current_user(&self) -> Option<User> {
        self.session.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn permissions(&self) -> Permissions {
        Permissions::for_user(self.session.read().await.as_ref().map(|s| &s.user))
    }

    pub async fn menu(&self) -> Vec<MenuEntry> {
        let guard = self.session.read().await;
        self.navigator
            .routes()
            .menu(guard.as_ref().map(|s| &s.user))
    }

    /// Picks up a stored session and refreshes its user record. A session
    /// the server no longer accepts is cleared.
    pub async fn restore(&self) -> Result<Option<User>> {
        let Some(mut session) = self.sessions.retrieve().await? else {
            return Ok(None);
        };
        self.api.set_token(Some(session.token.clone())).await;

        match self.api.fetch_profile().await {
            Ok(user) => {
                session.user = user;
                self.sessions.store(&session).await?;
            }
            Err(err) if matches!(err.code, ErrorCode::Unauthorized | ErrorCode::Forbidden) => {
                info!("session: stored session rejected, signing out");
                self.sessions.clear().await?;
                self.api.set_token(None).await;
                return Ok(None);
            }
            Err(err) => {
                warn!(error = %err, "session: profile refresh failed, using stored user");
            }
        }

        let user = session.user.clone();
        *self.session.write().await = Some(session);
        Ok(Some(user))
    }

    pub async fn login(&self, values: &FormValues) -> ScreenOutcome<Session> {
        let errors = login_schema().validate(values);
        if !errors.is_empty() {
            return ScreenOutcome::Invalid(errors);
        }
        let field = |key: &str| {
            values
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_default()
        };
        let request = LoginRequest {
            email: field("email").trim().to_string(),
            password: field("password"),
        };

        let session = match self.api.login(&request).await {
            Ok(session) => session,
            Err(err) => return ScreenOutcome::Failed(Notice::from_api(&err)),
        };
        if let Err(err) = self.sessions.store(&session).await {
            warn!(error = %err, "session: failed to persist session");
            return ScreenOutcome::Failed(Notice::error(
                shared::error::GENERIC_ERROR_MESSAGE,
            ));
        }
        self.api.set_token(Some(session.token.clone())).await;
        *self.session.write().await = Some(session.clone());
        if let Err(err) = self.navigator.navigate(names::HOME, NavParams::new()) {
            warn!(error = %err, "navigation after login failed");
        }
        info!(user_id = session.user.id.0, "session: signed in");

        ScreenOutcome::Done {
            notice: Notice::success(format!("Welcome, {}", session.user.first_name)),
            value: session,
        }
    }

    /// Clears the session only; nothing about the user is deleted.
    pub async fn logout(&self) -> Result<bool> {
        let had_session = self.sessions.clear().await?;
        self.api.set_token(None).await;
        *self.session.write().await = None;
        if let Err(err) = self.navigator.navigate(names::LOGIN, NavParams::new()) {
            warn!(error = %err, "navigation after logout failed");
        }
        Ok(had_session)
    }

    /// Adopts a session produced elsewhere, e.g. by the registration flow.
    pub async fn adopt(&self, session: Session) {
        self.api.set_token(Some(session.token.clone())).await;
        *self.session.write().await = Some(session);
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
