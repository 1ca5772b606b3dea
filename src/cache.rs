use crate::api::ApiClient;
use crate::errors::ClientError;
use crate::models::{Exercise, Workout};
use crate::session::SessionContext;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct CachedData {
    pub exercises: Vec<Exercise>,
    pub workouts: Vec<Workout>,
}

#[derive(Debug, Default)]
struct Slot {
    key: Option<i64>,
    data: CachedData,
}

/// Exercises and workouts as last confirmed by the server, keyed by user id.
#[derive(Clone, Default)]
pub struct DataCache {
    slot: Arc<Mutex<Slot>>,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached data, if it was loaded for `user_id`.
    pub async fn get(&self, user_id: i64) -> Option<CachedData> {
        let slot = self.slot.lock().await;
        (slot.key == Some(user_id)).then(|| slot.data.clone())
    }

    pub async fn store(&self, user_id: i64, data: CachedData) {
        let mut slot = self.slot.lock().await;
        slot.key = Some(user_id);
        slot.data = data;
    }

    /// Last data held, whatever its key.
    pub async fn snapshot(&self) -> CachedData {
        self.slot.lock().await.data.clone()
    }

    /// Forces a reload on next access while keeping the old data for display.
    pub async fn invalidate(&self) {
        self.slot.lock().await.key = None;
    }

    pub async fn clear(&self) {
        *self.slot.lock().await = Slot::default();
    }

    /// Returns the data for `user_id`, fetching it when the cache key differs.
    ///
    /// Both lists are requested together. The result is only stored if the
    /// session still belongs to `user_id` once the responses arrive.
    pub async fn load(
        &self,
        client: &ApiClient,
        session: &SessionContext,
        user_id: i64,
    ) -> Result<CachedData, ClientError> {
        if let Some(data) = self.get(user_id).await {
            return Ok(data);
        }

        debug!(user_id, "loading exercises and workouts");
        let (exercises, workouts) = tokio::try_join!(client.exercises(), client.workouts())?;
        let data = CachedData {
            exercises,
            workouts,
        };

        if session.is_current_user(user_id).await {
            self.store(user_id, data.clone()).await;
        } else {
            warn!(user_id, "discarding response loaded for a previous session");
        }
        Ok(data)
    }
}
