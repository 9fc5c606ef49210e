pub mod clock;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::LongRunError;

pub use clock::{Clock, FakeClock, SystemClock};

/// External one-shot invocation scheduler.
///
/// The controller only ever holds opaque trigger ids; creating, enumerating
/// and deleting triggers is the scheduler's business. `callback` is the
/// reference the scheduler invokes when the trigger fires — for this crate
/// that is the job-type name the host maps back to a runner.
#[async_trait]
pub trait TriggerScheduler: Send + Sync {
    async fn create_one_shot(&self, callback: &str, at: DateTime<Utc>) -> Result<String>;
    async fn list_active(&self) -> Result<Vec<String>>;
    async fn delete_by_id(&self, id: &str) -> Result<()>;
}

/// One armed one-shot invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub id: String,
    pub callback: String,
    pub fire_at: DateTime<Utc>,
}

/// In-memory scheduler for embedding hosts and test harnesses.
///
/// The host drives firing itself: it inspects `triggers()` (or `due(now)`)
/// and calls the matching runner when a fire time passes, then deletion
/// happens through the normal cancel path on the next invocation.
#[derive(Default)]
pub struct InMemoryScheduler {
    triggers: RwLock<Vec<Trigger>>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all armed triggers.
    pub async fn triggers(&self) -> Vec<Trigger> {
        self.triggers.read().await.clone()
    }

    /// Triggers whose fire time is at or before `now`.
    pub async fn due(&self, now: DateTime<Utc>) -> Vec<Trigger> {
        self.triggers
            .read()
            .await
            .iter()
            .filter(|t| t.fire_at <= now)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TriggerScheduler for InMemoryScheduler {
    async fn create_one_shot(&self, callback: &str, at: DateTime<Utc>) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        self.triggers.write().await.push(Trigger {
            id: id.clone(),
            callback: callback.to_string(),
            fire_at: at,
        });
        Ok(id)
    }

    async fn list_active(&self) -> Result<Vec<String>> {
        Ok(self
            .triggers
            .read()
            .await
            .iter()
            .map(|t| t.id.clone())
            .collect())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        let mut triggers = self.triggers.write().await;
        let before = triggers.len();
        triggers.retain(|t| t.id != id);
        if triggers.len() == before {
            return Err(
                LongRunError::Scheduler(format!("no active trigger with id '{}'", id)).into(),
            );
        }
        Ok(())
    }
}
