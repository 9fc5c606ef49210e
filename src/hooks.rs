use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::errors::LongRunError;

/// Optional pre-loop hook, invoked on every invocation of a job (resumed
/// invocations included) before any iteration runs.
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn run(&self, args: &str) -> Result<()>;
}

/// The per-iteration worker hook. `iteration` counts from 1.
#[async_trait]
pub trait Worker: Send + Sync {
    async fn run(&self, iteration: u64, args: &str) -> Result<()>;
}

/// Optional post-completion hook, invoked once the job reaches its terminal
/// state, with the configured iteration count.
#[async_trait]
pub trait Finalizer: Send + Sync {
    async fn run(&self, iterations: u64, args: &str) -> Result<()>;
}

/// Host-populated mapping from hook names to callables.
///
/// JobSettings carry hook *names*; the registry is the only place those names
/// resolve. The host registers everything at startup and hands the registry
/// to the runner — there is no ambient-scope lookup. A name that resolves to
/// nothing surfaces as a `MissingHook` error at call time.
#[derive(Default, Clone)]
pub struct HookRegistry {
    initializers: HashMap<String, Arc<dyn Initializer>>,
    workers: HashMap<String, Arc<dyn Worker>>,
    finalizers: HashMap<String, Arc<dyn Finalizer>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_initializer(&mut self, name: impl Into<String>, hook: Arc<dyn Initializer>) {
        self.initializers.insert(name.into(), hook);
    }

    pub fn register_worker(&mut self, name: impl Into<String>, hook: Arc<dyn Worker>) {
        self.workers.insert(name.into(), hook);
    }

    pub fn register_finalizer(&mut self, name: impl Into<String>, hook: Arc<dyn Finalizer>) {
        self.finalizers.insert(name.into(), hook);
    }

    pub fn initializer(&self, name: &str) -> Result<Arc<dyn Initializer>> {
        self.initializers
            .get(name)
            .cloned()
            .ok_or_else(|| LongRunError::MissingHook(name.to_string()).into())
    }

    pub fn worker(&self, name: &str) -> Result<Arc<dyn Worker>> {
        self.workers
            .get(name)
            .cloned()
            .ok_or_else(|| LongRunError::MissingHook(name.to_string()).into())
    }

    pub fn finalizer(&self, name: &str) -> Result<Arc<dyn Finalizer>> {
        self.finalizers
            .get(name)
            .cloned()
            .ok_or_else(|| LongRunError::MissingHook(name.to_string()).into())
    }
}
