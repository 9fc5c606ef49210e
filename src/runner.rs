use std::sync::Arc;

use anyhow::Result;

use crate::controller::LongRun;
use crate::hooks::HookRegistry;
use crate::models::{JobSettings, SettingsPatch};
use crate::scheduler::{Clock, TriggerScheduler};
use crate::storage::PropertyStore;

/// Terminal state of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every remaining iteration ran; nothing left to resume.
    Completed,
    /// The time budget ran out; a resume trigger is armed and a future
    /// invocation continues from the committed cursor.
    Suspended,
    /// A hook failed (or its name resolved to nothing). The failure is
    /// logged, the iteration is not retried, and finalization still ran.
    Failed,
}

/// Drives one invocation cycle of a long-running job.
///
/// The host constructs one `LongRunner` per job type, wiring in the store,
/// the external scheduler, a clock, and the hook registry, then calls
/// [`run`](Self::run) whenever the scheduler fires the job's callback (and
/// [`run_with`](Self::run_with) for the initial, override-carrying start).
pub struct LongRunner {
    job_type: String,
    store: Arc<dyn PropertyStore>,
    scheduler: Arc<dyn TriggerScheduler>,
    clock: Arc<dyn Clock>,
    hooks: HookRegistry,
}

impl LongRunner {
    pub fn new(
        job_type: impl Into<String>,
        store: Arc<dyn PropertyStore>,
        scheduler: Arc<dyn TriggerScheduler>,
        clock: Arc<dyn Clock>,
        hooks: HookRegistry,
    ) -> Self {
        Self {
            job_type: job_type.into(),
            store,
            scheduler,
            clock,
            hooks,
        }
    }

    /// One invocation cycle with no setting overrides — the shape every
    /// scheduler-fired resumption takes.
    pub async fn run(&self) -> Result<RunOutcome> {
        self.run_with(SettingsPatch::default()).await
    }

    /// One invocation cycle. Store and scheduler failures propagate; hook
    /// failures are caught, logged, and lead straight to finalization.
    pub async fn run_with(&self, overrides: SettingsPatch) -> Result<RunOutcome> {
        let mut job = LongRun::new(
            self.job_type.as_str(),
            self.store.clone(),
            self.scheduler.clone(),
            self.clock.clone(),
            overrides,
        )
        .await?;
        let settings = job.settings().clone();

        let outcome = self.drive(&mut job, &settings).await?;

        // Finalization runs whatever state the slice ended in. Whether the
        // job is over is decided solely by the armed-trigger slot — after a
        // hook failure with nothing armed, this resets and finalizes a job
        // that never ran to completion. Deliberate: see `is_finished`.
        if job.is_finished().await? {
            job.reset().await?;
            tracing::info!(
                job_type = %self.job_type,
                iterations = settings.iterations,
                outcome = ?outcome,
                "job finished"
            );
            if !settings.finalizer.is_empty() {
                if let Err(e) = self.call_finalizer(&settings).await {
                    tracing::error!(
                        job_type = %self.job_type,
                        hook = %settings.finalizer,
                        error = %e,
                        "finalizer hook failed"
                    );
                }
            }
        }

        Ok(outcome)
    }

    /// Initializing and Iterating, up to the first terminal transition.
    async fn drive(&self, job: &mut LongRun, settings: &JobSettings) -> Result<RunOutcome> {
        // Reading the cursor stamps the execution window and releases the
        // armed slot this invocation is consuming.
        let cursor = job.next_iteration().await?;

        // The initializer runs on every invocation, resumed ones included.
        if !settings.initializer.is_empty() {
            if let Err(e) = self.call_initializer(settings).await {
                tracing::error!(
                    job_type = %self.job_type,
                    hook = %settings.initializer,
                    error = %e,
                    "initializer hook failed"
                );
                return Ok(RunOutcome::Failed);
            }
        }

        for i in cursor..=settings.iterations {
            if job.check_suspend(i).await? {
                tracing::info!(job_type = %self.job_type, iteration = i, "iteration suspended");
                return Ok(RunOutcome::Suspended);
            }
            if let Err(e) = self.call_worker(settings, i).await {
                tracing::error!(
                    job_type = %self.job_type,
                    hook = %settings.main_process,
                    iteration = i,
                    error = %e,
                    "worker hook failed"
                );
                return Ok(RunOutcome::Failed);
            }
            tracing::info!(job_type = %self.job_type, iteration = i, "iteration done");
        }

        Ok(RunOutcome::Completed)
    }

    async fn call_initializer(&self, settings: &JobSettings) -> Result<()> {
        let hook = self.hooks.initializer(&settings.initializer)?;
        hook.run(&settings.args)
            .await
            .map_err(|e| hook_failure(&settings.initializer, e))
    }

    async fn call_worker(&self, settings: &JobSettings, iteration: u64) -> Result<()> {
        let hook = self.hooks.worker(&settings.main_process)?;
        hook.run(iteration, &settings.args)
            .await
            .map_err(|e| hook_failure(&settings.main_process, e))
    }

    async fn call_finalizer(&self, settings: &JobSettings) -> Result<()> {
        let hook = self.hooks.finalizer(&settings.finalizer)?;
        hook.run(settings.iterations, &settings.args)
            .await
            .map_err(|e| hook_failure(&settings.finalizer, e))
    }
}

/// Tag a hook's error with the registry name it was invoked under, so the
/// caught-and-logged failure says which hook blew up.
fn hook_failure(name: &str, err: anyhow::Error) -> anyhow::Error {
    crate::errors::LongRunError::Hook {
        name: name.to_string(),
        message: err.to_string(),
    }
    .into()
}
