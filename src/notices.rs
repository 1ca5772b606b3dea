use serde::Serialize;
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Transient notifications, shown once on the next rendered page.
#[derive(Clone, Default)]
pub struct Notices {
    queue: Arc<Mutex<VecDeque<Notice>>>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, level: NoticeLevel, message: impl Into<String>) {
        self.queue.lock().await.push_back(Notice {
            level,
            message: message.into(),
        });
    }

    pub async fn drain(&self) -> Vec<Notice> {
        self.queue.lock().await.drain(..).collect()
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_empties_the_queue_in_order() {
        let notices = Notices::new();
        notices.push(NoticeLevel::Success, "Workout saved").await;
        notices.push(NoticeLevel::Error, "Could not load exercises").await;

        let drained = notices.drain().await;
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "Workout saved");
        assert_eq!(drained[1].level, NoticeLevel::Error);
        assert!(notices.is_empty().await);
    }
}
