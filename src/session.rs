//! Session and auth gate.
//!
//! `SessionContext` is a cloneable handle passed explicitly to the API client
//! and the web state. Transitions:
//!
//! - `begin_check` enters `Authenticating` while a stored token is verified
//! - `establish` enters `Authenticated` after login, register or a good check
//! - `logout` and `expire` return to `Unauthenticated`

use crate::models::User;
use crate::notices::{NoticeLevel, Notices};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const SESSION_EXPIRED: &str = "Your session expired. Please sign in again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticating { token: String },
    Authenticated(Session),
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating { .. } => "authenticating",
            Self::Authenticated(_) => "authenticated",
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Unauthenticated => None,
            Self::Authenticating { token } => Some(token),
            Self::Authenticated(session) => Some(&session.token),
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(session) => Some(&session.user),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct SessionContext {
    state: Arc<Mutex<SessionState>>,
    notices: Notices,
}

impl SessionContext {
    pub fn new(notices: Notices) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::Unauthenticated)),
            notices,
        }
    }

    /// Starts out signed in, for callers that already hold a session.
    pub fn with_session(session: Session, notices: Notices) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::Authenticated(session))),
            notices,
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.lock().await.token().map(str::to_string)
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.lock().await.user().cloned()
    }

    pub async fn is_current_user(&self, user_id: i64) -> bool {
        self.state
            .lock()
            .await
            .user()
            .is_some_and(|user| user.id == user_id)
    }

    pub async fn begin_check(&self, token: String) {
        *self.state.lock().await = SessionState::Authenticating { token };
    }

    pub async fn establish(&self, session: Session) {
        info!(user = %session.user.username, "session established");
        *self.state.lock().await = SessionState::Authenticated(session);
    }

    /// Settles a credential check, unless the state moved on meanwhile.
    pub async fn settle_check(&self, token: &str, user: Option<User>) -> bool {
        let mut state = self.state.lock().await;
        match &*state {
            SessionState::Authenticating { token: pending } if pending == token => {}
            _ => return false,
        }
        *state = match user {
            Some(user) => SessionState::Authenticated(Session {
                user,
                token: token.to_string(),
            }),
            None => SessionState::Unauthenticated,
        };
        true
    }

    pub async fn logout(&self) -> Option<User> {
        let previous = std::mem::take(&mut *self.state.lock().await);
        let user = previous.user().cloned();
        if let Some(user) = &user {
            info!(user = %user.username, "signed out");
        }
        user
    }

    /// Clears the session after the server rejected `token`.
    ///
    /// Returns true only for the call that ended an authenticated session; that
    /// call alone raises the expiry notice. A rejection of a token that is no
    /// longer current is ignored.
    pub async fn expire(&self, token: &str) -> bool {
        let mut state = self.state.lock().await;
        if state.token() != Some(token) {
            return false;
        }
        let was_authenticated = matches!(*state, SessionState::Authenticated(_));
        *state = SessionState::Unauthenticated;
        drop(state);

        if was_authenticated {
            warn!("session expired");
            self.notices.push(NoticeLevel::Warning, SESSION_EXPIRED).await;
        }
        was_authenticated
    }
}
