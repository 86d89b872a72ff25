use std::sync::Arc;

use common::error::{CrError, CrResult};
use log::{info, warn};
use rental_portal_common::user::Session;

use crate::{
    api::{AuthorizedApi, ReqwestTransport, SharedTransport, UnauthorizedApi},
    cache::QueryCache,
    config::ClientConfig,
    forms::{login::LoginForm, register::RegisterWizard},
    session::{FileSessionRepository, SessionRepository, SessionStore},
};

/// Everything a page needs to talk to the backend: configuration, the HTTP layer, the session
/// store and the query cache. Created once per process and shared by reference.
pub struct AppContext {
    config: ClientConfig,
    api: UnauthorizedApi,
    session: SessionStore,
    cache: QueryCache,
}

impl AppContext {
    pub fn new(
        config: ClientConfig,
        transport: SharedTransport,
        repository: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            config,
            api: UnauthorizedApi::new(transport),
            session: SessionStore::new(repository),
            cache: QueryCache::new(),
        }
    }

    /// Context talking to the configured backend over HTTP with the session kept in the
    /// configured file. The stored session is restored before returning.
    pub async fn start(config: ClientConfig) -> Self {
        let transport = Arc::new(ReqwestTransport::new(config.api_base_url.clone()));
        let repository = Arc::new(FileSessionRepository::new(config.session_file.clone()));
        let context = Self::new(config, transport, repository);
        context.session.rehydrate().await;
        context
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub const fn api(&self) -> &UnauthorizedApi {
        &self.api
    }

    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// API handle carrying the current session token
    /// # Errors
    /// This function will return [CrError::MissingToken] if nobody is signed in
    pub async fn authorized(&self) -> CrResult<AuthorizedApi> {
        match self.session.token().await {
            Some(token) => Ok(self.api.authorize(token)),
            None => {
                warn!("Authenticated call attempted without a session token");
                Err(CrError::MissingToken)
            }
        }
    }

    /// Validate the login `form`, sign in and store the session. Backend failures are recorded
    /// in the session store as the error to display.
    /// # Errors
    /// This function will return an error if the form is invalid or the login fails
    pub async fn login(&self, form: &LoginForm) -> CrResult<Session> {
        let credentials = form.credentials()?;
        self.session.login_start().await;
        match self.api.login(&credentials).await {
            Ok(session) => {
                info!("Signed in as {}", session.user.email);
                self.cache.clear().await;
                if let Err(error) = self.session.login_success(session.clone()).await {
                    warn!("Session will not survive a restart. {error}");
                }
                Ok(session)
            }
            Err(error) => {
                self.session.login_failure(error.user_message()).await;
                Err(error)
            }
        }
    }

    /// Validate every step of the sign up `wizard`, create the account and store the session
    /// # Errors
    /// This function will return an error if the form is invalid or the registration fails
    pub async fn register(&self, wizard: &mut RegisterWizard) -> CrResult<Session> {
        let request = wizard.request()?;
        self.session.register_start().await;
        match self.api.register(&request).await {
            Ok(session) => {
                info!("Registered {}", session.user.email);
                self.cache.clear().await;
                if let Err(error) = self.session.register_success(session.clone()).await {
                    warn!("Session will not survive a restart. {error}");
                }
                Ok(session)
            }
            Err(error) => {
                self.session.register_failure(error.user_message()).await;
                Err(error)
            }
        }
    }

    /// Sign out. The backend is told first but its answer does not block the local sign out.
    /// # Errors
    /// This function will return an error if the stored session cannot be removed
    pub async fn logout(&self) -> CrResult<()> {
        if let Ok(api) = self.authorized().await {
            if let Err(error) = api.logout().await {
                warn!("Backend logout failed. {error}");
            }
        }
        self.cache.clear().await;
        self.session.logout().await
    }
}
