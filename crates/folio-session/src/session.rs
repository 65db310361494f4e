//! Authoritative client-side session.
//!
//! `SessionStore` holds the signed-in user and the credential pair, tracks
//! its lifecycle through the session state machine, and keeps persisted
//! storage in step with memory. Persisted credentials are restored once per
//! process by [`SessionStore::hydrate`].

use crate::download_tokens::DownloadTokenCache;
use crate::error::{SessionError, SessionResult};
use crate::loading::LoadingFlag;
use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionPhase};
use crate::transport::ApiClient;
use crate::types::{AuthPayload, AuthUser, LoginInput, RegisterInput};
use folio_storage::CredentialStore;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub user: Option<AuthUser>,
    pub loading: bool,
    pub initialized: bool,
}

struct SessionState {
    machine: SessionMachine,
    user: Option<AuthUser>,
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl SessionState {
    fn phase(&self) -> SessionPhase {
        SessionPhase::from(self.machine.state())
    }

    fn apply(&mut self, input: SessionMachineInput) -> SessionPhase {
        let from = self.phase();
        if self.machine.consume(&input).is_err() {
            warn!(from = %from, input = ?input, "Ignoring impossible session transition");
            return from;
        }
        let to = self.phase();
        if from != to {
            debug!(from = %from, to = %to, "Session phase changed");
        }
        to
    }

    fn clear(&mut self) {
        self.user = None;
        self.access_token = None;
        self.refresh_token = None;
    }
}

pub struct SessionStore {
    api: Arc<ApiClient>,
    credentials: CredentialStore,
    download_tokens: Arc<DownloadTokenCache>,
    state: Mutex<SessionState>,
    loading: LoadingFlag,
    // Held across the identity check so concurrent hydrations share one request
    hydration: tokio::sync::Mutex<()>,
}

impl SessionStore {
    /// New store seeded with whatever credentials are persisted. No network
    /// traffic happens until [`hydrate`](Self::hydrate).
    pub fn new(
        api: Arc<ApiClient>,
        credentials: CredentialStore,
        download_tokens: Arc<DownloadTokenCache>,
    ) -> Self {
        let access_token = read_or_warn(credentials.access_token(), "access token");
        let refresh_token = read_or_warn(credentials.refresh_token(), "refresh token");

        Self {
            api,
            credentials,
            download_tokens,
            state: Mutex::new(SessionState {
                machine: SessionMachine::new(),
                user: None,
                access_token,
                refresh_token,
            }),
            loading: LoadingFlag::new(),
            hydration: tokio::sync::Mutex::new(()),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase()
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.state.lock().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.lock().user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    /// Whether restoration has finished. Never goes back to false.
    pub fn is_initialized(&self) -> bool {
        self.phase().is_initialized()
    }

    /// Whether an access token is held in memory.
    pub fn has_credentials(&self) -> bool {
        self.state.lock().access_token.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        let phase = state.phase();
        SessionSnapshot {
            phase,
            user: state.user.clone(),
            loading: self.loading.is_loading(),
            initialized: phase.is_initialized(),
        }
    }

    /// Restore the session from persisted credentials.
    ///
    /// Runs at most once per process. Without an access token the session
    /// becomes anonymous without touching the network. Otherwise the token
    /// is verified against `/users/me`; any failure logs the user out.
    /// Concurrent callers wait for the first one and issue no extra request.
    pub async fn hydrate(&self) {
        if self.is_initialized() {
            return;
        }
        let _flight = self.hydration.lock().await;
        if self.is_initialized() {
            return;
        }

        let has_token = self.state.lock().access_token.is_some();
        if !has_token {
            self.state.lock().apply(SessionMachineInput::NoCredentials);
            debug!("No stored credentials, continuing anonymously");
            return;
        }

        let result = self.api.users().me().await;

        let mut state = self.state.lock();
        if state.phase().is_initialized() {
            // A login or logout finished while the check was in flight; it wins
            debug!("Session settled during identity check, discarding result");
            if matches!(&result, Err(e) if e.is_unauthorized()) {
                // The 401 purged storage after the newer pair was written
                restore_persisted(&self.credentials, &state);
            }
            return;
        }

        match result {
            Ok(user) => {
                info!(user_id = %user.id, "Session restored");
                state.user = Some(user);
                state.apply(SessionMachineInput::IdentityVerified);
            }
            Err(e) => {
                warn!(error = %e, "Stored credentials rejected, signing out");
                state.clear();
                state.apply(SessionMachineInput::IdentityRejected);
                self.purge_persisted();
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// On failure the error is returned unchanged and the session is untouched.
    pub async fn login(&self, input: &LoginInput) -> SessionResult<AuthUser> {
        let _loading = self.loading.begin();
        let payload = self.api.auth().login(input).await?;
        self.establish(payload)
    }

    /// Create an account and sign in as it.
    pub async fn register(&self, input: &RegisterInput) -> SessionResult<AuthUser> {
        let _loading = self.loading.begin();
        let payload = self.api.auth().register(input).await?;
        self.establish(payload)
    }

    /// Rotate the credential pair using the refresh token.
    ///
    /// A 401 from the server ends the session before the error is returned.
    pub async fn refresh(&self) -> SessionResult<()> {
        let refresh_token = {
            let state = self.state.lock();
            match (&state.refresh_token, state.phase()) {
                (Some(token), phase) if phase != SessionPhase::Anonymous => token.clone(),
                _ => return Err(SessionError::NotAuthenticated),
            }
        };

        let pair = match self.api.auth().refresh(&refresh_token).await {
            Ok(pair) => pair,
            Err(e) if e.is_unauthorized() => {
                warn!("Refresh token rejected, signing out");
                self.logout();
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        let mut state = self.state.lock();
        if state.phase() == SessionPhase::Anonymous {
            debug!("Signed out while refreshing, discarding rotated credentials");
            return Err(SessionError::NotAuthenticated);
        }
        self.credentials
            .set_pair(&pair.access_token, &pair.refresh_token)?;
        state.access_token = Some(pair.access_token);
        state.refresh_token = Some(pair.refresh_token);
        state.apply(SessionMachineInput::CredentialsRotated);
        info!("Credentials rotated");
        Ok(())
    }

    /// End the session: memory, persisted credentials, and cached download tokens.
    pub fn logout(&self) {
        self.teardown(SessionMachineInput::SignedOut);
    }

    // Storage and memory change together under the state lock, so a
    // restoration settling concurrently never sees one without the other.
    fn establish(&self, payload: AuthPayload) -> SessionResult<AuthUser> {
        let mut state = self.state.lock();
        self.credentials
            .set_pair(&payload.access_token, &payload.refresh_token)?;

        let user = payload.user;
        state.user = Some(user.clone());
        state.access_token = Some(payload.access_token);
        state.refresh_token = Some(payload.refresh_token);
        state.apply(SessionMachineInput::SessionEstablished);
        info!(user_id = %user.id, role = %user.role, "Session established");
        Ok(user)
    }

    fn teardown(&self, input: SessionMachineInput) {
        let mut state = self.state.lock();
        state.clear();
        state.apply(input);
        self.purge_persisted();
    }

    fn purge_persisted(&self) {
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "Failed to remove stored credentials");
        }
        self.download_tokens.clear_all();
        info!("Session cleared");
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

fn restore_persisted(credentials: &CredentialStore, state: &SessionState) {
    if let (Some(access), Some(refresh)) = (&state.access_token, &state.refresh_token) {
        match credentials.set_pair(access, refresh) {
            Ok(()) => debug!("Re-persisted credentials purged by a stale request"),
            Err(e) => warn!(error = %e, "Failed to re-persist credentials"),
        }
    }
}

fn read_or_warn(result: folio_storage::StorageResult<Option<String>>, what: &str) -> Option<String> {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to read stored {}", what);
        None
    })
}
