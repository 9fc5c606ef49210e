//! Run-loop behavior over the file-backed store: a suspended job survives a
//! store restart (new `JsonPropertyStore` over the same directory) the way it
//! survives the gap between scheduler invocations.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use longrun::{
    FakeClock, HookRegistry, InMemoryScheduler, JsonPropertyStore, LongRunner, RunOutcome,
    SettingsPatch, Worker,
};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0).unwrap()
}

struct CostlyWorker {
    log: Arc<Mutex<Vec<u64>>>,
    clock: Arc<FakeClock>,
}

#[async_trait]
impl Worker for CostlyWorker {
    async fn run(&self, iteration: u64, _args: &str) -> Result<()> {
        self.log.lock().unwrap().push(iteration);
        self.clock.advance(Duration::seconds(2));
        Ok(())
    }
}

fn registry(log: Arc<Mutex<Vec<u64>>>, clock: Arc<FakeClock>) -> HookRegistry {
    let mut registry = HookRegistry::new();
    registry.register_worker("exportChunk", Arc::new(CostlyWorker { log, clock }));
    registry
}

#[tokio::test]
async fn test_suspended_job_resumes_after_store_restart() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let tmp_dir = TempDir::new().expect("create temp dir");
    let scheduler = Arc::new(InMemoryScheduler::new());
    let clock = Arc::new(FakeClock::new(base_time()));
    let log = Arc::new(Mutex::new(Vec::new()));

    // Invocation 1: budget 3s, 2s per iteration — suspends after two.
    {
        let store = Arc::new(
            JsonPropertyStore::new(tmp_dir.path().to_path_buf())
                .await
                .expect("create store"),
        );
        let runner = LongRunner::new(
            "Export",
            store,
            scheduler.clone(),
            clock.clone(),
            registry(log.clone(), clock.clone()),
        );
        let outcome = runner
            .run_with(SettingsPatch {
                iterations: Some(4),
                max_execution_seconds: Some(3),
                main_process: Some("exportChunk".to_string()),
                ..Default::default()
            })
            .await
            .expect("invocation 1");
        assert_eq!(outcome, RunOutcome::Suspended);
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }

    // Invocation 2, through a brand new store over the same directory: the
    // persisted settings and cursor drive it to completion.
    {
        let store = Arc::new(
            JsonPropertyStore::new(tmp_dir.path().to_path_buf())
                .await
                .expect("reopen store"),
        );
        let runner = LongRunner::new(
            "Export",
            store.clone(),
            scheduler.clone(),
            clock.clone(),
            registry(log.clone(), clock.clone()),
        );
        let outcome = runner.run().await.expect("invocation 2");
        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3, 4]);
        assert!(scheduler.triggers().await.is_empty());

        // Terminal state cleared every key.
        use longrun::PropertyStore;
        assert!(store.get("ExportSettings").await.expect("get").is_none());
        assert!(store
            .get("ExportNextIteration")
            .await
            .expect("get")
            .is_none());
        assert!(store.get("ExportTriggerId").await.expect("get").is_none());
    }
}
