use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

use crate::keys::PropertyKeys;
use crate::models::{JobSettings, SettingsPatch};
use crate::scheduler::{Clock, TriggerScheduler};
use crate::storage::PropertyStore;

/// Suspend/resume controller for one job type.
///
/// A `LongRun` is constructed once per invocation. Construction resolves the
/// settings layers (defaults, then the persisted record, then the caller's
/// overrides), writes the merged result back so resumed invocations see it,
/// and loads the iteration cursor. From there the invocation asks
/// [`check_suspend`](Self::check_suspend) before each unit of work; a true
/// answer means the cursor has been committed and a resume trigger armed, and
/// the invocation must stop issuing work.
///
/// Whether the job as a whole is over is never tracked directly: the armed
/// trigger slot is the single source of truth. No armed trigger means no
/// future invocation is coming, so the job is finished.
pub struct LongRun {
    job_type: String,
    keys: PropertyKeys,
    store: Arc<dyn PropertyStore>,
    scheduler: Arc<dyn TriggerScheduler>,
    clock: Arc<dyn Clock>,
    settings: JobSettings,
    cursor: u64,
    window_start: Option<DateTime<Utc>>,
}

impl LongRun {
    /// Resolve settings, persist the merged record, and load the cursor.
    ///
    /// The merged record is written back even when `overrides` is empty, so
    /// defaults introduced by the running code are captured for resumed
    /// invocations of the same run.
    pub async fn new(
        job_type: impl Into<String>,
        store: Arc<dyn PropertyStore>,
        scheduler: Arc<dyn TriggerScheduler>,
        clock: Arc<dyn Clock>,
        overrides: SettingsPatch,
    ) -> Result<Self> {
        let job_type = job_type.into();
        let keys = PropertyKeys::for_job_type(&job_type);

        let persisted = store
            .get(&keys.settings)
            .await
            .context("Failed to read persisted settings")?;
        let mut settings = JobSettings::from_persisted(persisted.as_deref())?;
        settings.apply(&overrides);
        settings.validate()?;

        let record = serde_json::to_string(&settings).context("Failed to serialize settings")?;
        store
            .set(&keys.settings, &record)
            .await
            .context("Failed to persist settings")?;

        // Absent or unparseable cursor means the first iteration.
        let cursor = match store
            .get(&keys.next_iteration)
            .await
            .context("Failed to read iteration cursor")?
        {
            Some(raw) => raw.parse::<u64>().unwrap_or(1),
            None => 1,
        };

        Ok(Self {
            job_type,
            keys,
            store,
            scheduler,
            clock,
            settings,
            cursor,
            window_start: None,
        })
    }

    pub fn job_type(&self) -> &str {
        &self.job_type
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    /// Next iteration index to run (1 is the first).
    ///
    /// Stamps the execution-window start and releases the armed trigger slot:
    /// the invocation consuming this cursor is the one that trigger fired, so
    /// the slot is cleared now and only re-armed if this slice suspends.
    pub async fn next_iteration(&mut self) -> Result<u64> {
        self.window_start = Some(self.clock.now());
        self.cancel_trigger().await?;
        Ok(self.cursor)
    }

    /// Decide whether this slice has run long enough and must stop.
    ///
    /// If elapsed time since the window start has reached the budget, the
    /// cursor is committed to `next_iteration` and a resume trigger is armed,
    /// as one step; otherwise nothing changes. The check belongs *before*
    /// each iteration's work — it bounds the next slice of work using only
    /// time already consumed. A budget of zero therefore suspends before any
    /// iteration runs in the current invocation.
    pub async fn check_suspend(&mut self, next_iteration: u64) -> Result<bool> {
        let start = match self.window_start {
            Some(t) => t,
            None => {
                let now = self.clock.now();
                self.window_start = Some(now);
                now
            }
        };
        let elapsed = (self.clock.now() - start).num_seconds();

        if elapsed >= self.settings.max_execution_seconds as i64 {
            self.store
                .set(&self.keys.next_iteration, &next_iteration.to_string())
                .await
                .context("Failed to commit iteration cursor")?;
            self.arm_trigger().await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// True iff no resume trigger is armed for this job type.
    ///
    /// This is the sole completion signal — a side effect of whether a
    /// suspend decision ever armed a new invocation, not a count of
    /// iterations run.
    pub async fn is_finished(&self) -> Result<bool> {
        let armed = self
            .store
            .get(&self.keys.trigger_id)
            .await
            .context("Failed to read trigger id")?;
        Ok(armed.is_none())
    }

    /// Cancel any armed trigger and delete all persisted state for this job
    /// type. Unconditional and immediate; the next invocation starts fresh.
    pub async fn reset(&mut self) -> Result<()> {
        self.cancel_trigger().await?;
        self.store
            .delete(&self.keys.settings)
            .await
            .context("Failed to delete settings")?;
        self.store
            .delete(&self.keys.next_iteration)
            .await
            .context("Failed to delete iteration cursor")?;
        Ok(())
    }

    /// Delete the armed trigger, if any, and its persisted id.
    ///
    /// Idempotent: nothing persisted, or a stale id the scheduler no longer
    /// knows, is a no-op rather than an error.
    pub async fn cancel_trigger(&self) -> Result<()> {
        let Some(id) = self
            .store
            .get(&self.keys.trigger_id)
            .await
            .context("Failed to read trigger id")?
        else {
            return Ok(());
        };

        let active = self
            .scheduler
            .list_active()
            .await
            .context("Failed to list active triggers")?;
        if active.iter().any(|a| *a == id) {
            self.scheduler
                .delete_by_id(&id)
                .await
                .context("Failed to delete trigger")?;
        }

        self.store
            .delete(&self.keys.trigger_id)
            .await
            .context("Failed to delete trigger id")?;
        Ok(())
    }

    /// Arm a one-shot resume trigger after the configured delay and persist
    /// its id. Cancels first so at most one trigger is ever outstanding,
    /// whatever the caller does.
    async fn arm_trigger(&self) -> Result<()> {
        self.cancel_trigger().await?;

        let fire_at = self.clock.now() + Duration::minutes(self.settings.delay_minutes as i64);
        let id = self
            .scheduler
            .create_one_shot(&self.job_type, fire_at)
            .await
            .context("Failed to create resume trigger")?;
        self.store
            .set(&self.keys.trigger_id, &id)
            .await
            .context("Failed to persist trigger id")?;

        tracing::debug!(
            job_type = %self.job_type,
            trigger_id = %id,
            fire_at = %fire_at,
            "armed resume trigger"
        );
        Ok(())
    }
}
