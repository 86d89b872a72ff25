use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use common::error::CrResult;
use log::{error, info, warn};
use rental_portal_common::user::{Session, User};
use tokio::sync::RwLock;

/// Persistence of the single session record
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SessionRepository: Send + Sync {
    /// Read the stored session. Returns [None] when nothing is stored.
    async fn load(&self) -> CrResult<Option<Session>>;
    /// Replace the stored session with `session`
    async fn save(&self, session: &Session) -> CrResult<()>;
    /// Remove the stored session. Clearing an empty repository is not an error.
    async fn clear(&self) -> CrResult<()>;
}

/// [SessionRepository] keeping the session as a JSON file
pub struct FileSessionRepository {
    path: PathBuf,
}

impl FileSessionRepository {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl SessionRepository for FileSessionRepository {
    async fn load(&self) -> CrResult<Option<Session>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(&self, session: &Session) -> CrResult<()> {
        let bytes = serde_json::to_vec(session)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn clear(&self) -> CrResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// [SessionRepository] holding the serialized record in memory. Used when nothing should outlive
/// the process.
#[derive(Default)]
pub struct MemorySessionRepository {
    record: RwLock<Option<String>>,
}

impl MemorySessionRepository {
    /// Repository pre-loaded with a raw `record`, which does not have to be a valid session
    pub fn with_record<R: Into<String>>(record: R) -> Self {
        Self {
            record: RwLock::new(Some(record.into())),
        }
    }

    /// Raw stored record
    pub async fn record(&self) -> Option<String> {
        self.record.read().await.clone()
    }
}

#[async_trait::async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn load(&self) -> CrResult<Option<Session>> {
        match self.record.read().await.as_deref() {
            Some(record) => Ok(Some(serde_json::from_str(record)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, session: &Session) -> CrResult<()> {
        *self.record.write().await = Some(serde_json::to_string(session)?);
        Ok(())
    }

    async fn clear(&self) -> CrResult<()> {
        *self.record.write().await = None;
        Ok(())
    }
}

/// Snapshot of the authentication state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    /// Set once the persisted session has been read. Guards wait on this flag.
    pub hydrated: bool,
}

impl SessionState {
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.user.as_ref().map_or(false, User::is_admin)
    }

    /// Reset the identity fields, keeping the hydration flag
    fn sign_out(&mut self) {
        self.user = None;
        self.token = None;
        self.loading = false;
    }
}

/// Authentication store shared by every page. Memory state is the source of truth while the
/// process runs; the repository only keeps it across restarts.
pub struct SessionStore {
    repository: Arc<dyn SessionRepository>,
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            repository,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Restore the persisted session. Unreadable records are discarded so the next start does
    /// not trip over them again. Always marks the store as hydrated.
    pub async fn rehydrate(&self) {
        let loaded = match self.repository.load().await {
            Ok(session) => session,
            Err(error) => {
                warn!("Discarding unreadable session record. {error}");
                if let Err(error) = self.repository.clear().await {
                    error!("Could not clear session record. {error}");
                }
                None
            }
        };
        let mut state = self.state.write().await;
        if let Some(session) = loaded {
            info!("Restored session for {}", session.user.email);
            state.user = Some(session.user);
            state.token = Some(session.token);
        }
        state.hydrated = true;
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    /// Flag the start of a login attempt
    pub async fn login_start(&self) {
        self.begin().await;
    }

    /// Store the `session` of a successful login
    /// # Errors
    /// This function will return an error if the session cannot be persisted. The memory state is
    /// updated regardless.
    pub async fn login_success(&self, session: Session) -> CrResult<()> {
        self.establish(session).await
    }

    /// Record a failed login with the user facing `message`
    pub async fn login_failure<M: Into<String>>(&self, message: M) {
        self.fail(message.into()).await;
    }

    /// Flag the start of a registration attempt
    pub async fn register_start(&self) {
        self.begin().await;
    }

    /// Store the `session` of a successful registration
    /// # Errors
    /// This function will return an error if the session cannot be persisted. The memory state is
    /// updated regardless.
    pub async fn register_success(&self, session: Session) -> CrResult<()> {
        self.establish(session).await
    }

    /// Record a failed registration with the user facing `message`
    pub async fn register_failure<M: Into<String>>(&self, message: M) {
        self.fail(message.into()).await;
    }

    /// Replace the current user with the fresh `user` record, e.g. after a profile edit. Ignored
    /// when nobody is signed in.
    /// # Errors
    /// This function will return an error if the session cannot be persisted
    pub async fn update_user(&self, user: User) -> CrResult<()> {
        let session = {
            let mut state = self.state.write().await;
            let Some(token) = state.token.clone() else {
                warn!("Ignoring user update without an active session");
                return Ok(());
            };
            state.user = Some(user.clone());
            Session { user, token }
        };
        self.repository.save(&session).await
    }

    /// Drop the session from memory and from the repository
    /// # Errors
    /// This function will return an error if the persisted record cannot be removed. The memory
    /// state is cleared regardless.
    pub async fn logout(&self) -> CrResult<()> {
        {
            let mut state = self.state.write().await;
            state.sign_out();
            state.error = None;
        }
        self.repository.clear().await
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    async fn begin(&self) {
        let mut state = self.state.write().await;
        state.loading = true;
        state.error = None;
    }

    async fn establish(&self, session: Session) -> CrResult<()> {
        {
            let mut state = self.state.write().await;
            state.user = Some(session.user.clone());
            state.token = Some(session.token.clone());
            state.loading = false;
            state.error = None;
        }
        self.repository.save(&session).await.map_err(|error| {
            error!("Could not persist session. {error}");
            error
        })
    }

    async fn fail(&self, message: String) {
        let mut state = self.state.write().await;
        state.sign_out();
        state.error = Some(message);
    }
}
