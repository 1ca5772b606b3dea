use crate::api::ApiClient;
use crate::cache::{CachedData, DataCache};
use crate::config::Settings;
use crate::errors::ClientError;
use crate::models::{User, WorkoutEntry};
use crate::notices::{NoticeLevel, Notices};
use crate::session::SessionContext;
use chrono::FixedOffset;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub client: ApiClient,
    pub session: SessionContext,
    pub notices: Notices,
    pub cache: DataCache,
    /// Entries of the workout being logged, not yet saved.
    pub draft: Arc<Mutex<Vec<WorkoutEntry>>>,
    pub utc_offset: FixedOffset,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let notices = Notices::new();
        let session = SessionContext::new(notices.clone());
        let client = ApiClient::new(
            settings.api_base_url.clone(),
            settings.request_timeout,
            session.clone(),
        )?;
        Ok(Self::from_parts(client, session, notices, settings.utc_offset))
    }

    pub fn from_parts(
        client: ApiClient,
        session: SessionContext,
        notices: Notices,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            client,
            session,
            notices,
            cache: DataCache::new(),
            draft: Arc::new(Mutex::new(Vec::new())),
            utc_offset,
        }
    }

    pub async fn data_for(&self, user: &User) -> Result<CachedData, ClientError> {
        self.cache.load(&self.client, &self.session, user.id).await
    }

    /// Reports a failed operation once. Unauthorized is announced by the session.
    pub async fn report(&self, operation: &str, err: &ClientError) {
        error!("failed to {operation}: {err}");
        if let Some(message) = err.notice(operation) {
            self.notices.push(NoticeLevel::Error, message).await;
        }
    }

    /// Drops everything cached for the user whose session ended.
    pub async fn forget_user_data(&self) {
        self.cache.clear().await;
        self.draft.lock().await.clear();
    }

    pub async fn sign_out(&self) {
        self.session.logout().await;
        self.forget_user_data().await;
    }
}
