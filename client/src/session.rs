//! Session Manager: the state machine over sign-in, sign-out and restore.
//!
//! The manager owns the bearer token. It lives in the published
//! [`SessionState`], so clearing the session and clearing the token are the
//! same single step, and every caller that needs a token asks for it here.

use crate::api::{BearerToken, RemoteClient};
use crate::error::{Error, Result};
use crate::store::LocalStore;
use rentx_engine::{ProfileUpdate, Revision, User};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Where the session lifecycle currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The local store has not been consulted yet
    Restoring,
    Unauthenticated,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_restoring(&self) -> bool {
        matches!(self, SessionState::Restoring)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    fn token(&self) -> Option<BearerToken> {
        self.user()
            .map(|user| BearerToken::new(user.session_token.clone()))
    }
}

/// What routing needs to know about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub user: Option<User>,
    pub is_restoring: bool,
}

/// Drives the session lifecycle against the local store and the server.
pub struct SessionManager {
    store: Arc<LocalStore>,
    remote: Arc<RemoteClient>,
    state: watch::Sender<SessionState>,
    /// Serializes session mutations and push acknowledgements
    op_lock: Mutex<()>,
}

impl SessionManager {
    /// A manager in the [`SessionState::Restoring`] state.
    pub fn new(store: Arc<LocalStore>, remote: Arc<RemoteClient>) -> Self {
        let (state, _) = watch::channel(SessionState::Restoring);
        Self {
            store,
            remote,
            state,
            op_lock: Mutex::new(()),
        }
    }

    /// Resolve `Restoring` from the resident user record.
    ///
    /// Only reads the store's committed snapshot, which already dropped any
    /// unusable user row when it was opened.
    pub fn restore(&self) -> SessionState {
        let next = match self.store.find_user() {
            Some(user) => {
                info!(local_id = %user.local_id, "session restored");
                SessionState::Authenticated(user)
            }
            None => {
                info!("no session to restore");
                SessionState::Unauthenticated
            }
        };
        self.state.send_replace(next.clone());
        next
    }

    /// Sign in and persist the returned user.
    ///
    /// Fails with [`Error::Conflict`] while already signed in, without
    /// contacting the server. The session lock is released for the login
    /// request and the state is checked again before the user is stored.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        {
            let _guard = self.op_lock.lock().await;
            self.ensure_signed_out()?;
        }

        let response = match self.remote.login(email, password).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "sign-in failed");
                return Err(e);
            }
        };

        let _guard = self.op_lock.lock().await;
        self.ensure_signed_out()?;
        let user = self.store.create_user(response.into_new_user()).await?;
        self.state
            .send_replace(SessionState::Authenticated(user.clone()));

        info!(local_id = %user.local_id, remote_id = %user.remote_id, "signed in");
        Ok(user)
    }

    fn ensure_signed_out(&self) -> Result<()> {
        match self.state() {
            SessionState::Restoring => Err(Error::SessionRestoring),
            SessionState::Authenticated(user) => Err(Error::Conflict(format!(
                "already signed in as {}",
                user.email
            ))),
            SessionState::Unauthenticated => Ok(()),
        }
    }

    /// Drop the session locally. Never touches the network.
    pub async fn sign_out(&self) -> Result<()> {
        let _guard = self.op_lock.lock().await;
        if self.state.borrow().is_restoring() {
            return Err(Error::SessionRestoring);
        }

        if let Some(user) = self.store.find_user() {
            match self.store.delete_user(&user.local_id).await {
                Ok(_) | Err(Error::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        self.state.send_replace(SessionState::Unauthenticated);

        info!("signed out");
        Ok(())
    }

    /// Apply a local profile edit. Propagation happens in the next push.
    pub async fn update_user(&self, local_id: &str, update: ProfileUpdate) -> Result<User> {
        let _guard = self.op_lock.lock().await;
        if self.state.borrow().is_restoring() {
            return Err(Error::SessionRestoring);
        }

        let resident = self
            .store
            .find_user()
            .filter(|user| user.local_id == local_id)
            .ok_or_else(|| Error::NotFound(format!("user {local_id} is not signed in")))?;

        if update.is_empty() {
            return Ok(resident);
        }

        let user = self
            .store
            .update_user(local_id, |user| update.apply_to(user))
            .await?;
        self.state
            .send_replace(SessionState::Authenticated(user.clone()));

        debug!(local_id, revision = user.revision, "profile updated");
        Ok(user)
    }

    /// Record a successful push of `revision`.
    ///
    /// Returns `None` if that user is no longer signed in, in which case the
    /// acknowledgement is dropped.
    pub async fn acknowledge_push(
        &self,
        local_id: &str,
        revision: Revision,
    ) -> Result<Option<User>> {
        let _guard = self.op_lock.lock().await;
        if !self.holds(local_id) {
            return Ok(None);
        }

        let user = self.store.mark_user_pushed(local_id, revision).await?;
        self.state
            .send_replace(SessionState::Authenticated(user.clone()));
        Ok(Some(user))
    }

    /// Whether `local_id` is the resident user.
    pub fn holds(&self, local_id: &str) -> bool {
        self.store
            .find_user()
            .is_some_and(|user| user.local_id == local_id)
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> SessionView {
        let state = self.state.borrow();
        SessionView {
            user: state.user().cloned(),
            is_restoring: state.is_restoring(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The token for the next request, if signed in.
    pub fn token(&self) -> Option<BearerToken> {
        self.state.borrow().token()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }
}
