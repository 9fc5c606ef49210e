//! Suspend/resume controller for jobs that outlive a single time-boxed
//! invocation.
//!
//! Some hosts never hand a process a long-lived thread of control: an
//! external scheduler invokes a callback, the callback gets a bounded slice
//! of wall clock, and anything unfinished is simply cut off. This crate runs
//! an iterative job to completion under that regime by checkpointing the
//! next-iteration cursor to a durable property store and arming a one-shot
//! trigger to continue in a later invocation.
//!
//! The moving parts:
//!
//! - [`LongRun`] — the per-invocation controller: settings resolution, the
//!   iteration cursor, the suspend decision, and trigger arm/cancel.
//! - [`LongRunner`] — the invocation driver: calls the registered hooks
//!   iteration by iteration and handles finalization.
//! - [`PropertyStore`] / [`TriggerScheduler`] — the seams to the host's
//!   durable store and scheduler, with in-memory and JSON-file
//!   implementations included.
//! - [`HookRegistry`] — the host's explicit name-to-callable hook mapping.
//!
//! Invocations of one job type are assumed logically sequential; there is no
//! cross-process locking and overlapping invocations can corrupt the cursor.

pub mod controller;
pub mod errors;
pub mod hooks;
pub mod keys;
pub mod models;
pub mod runner;
pub mod scheduler;
pub mod storage;

pub use controller::LongRun;
pub use errors::LongRunError;
pub use hooks::{Finalizer, HookRegistry, Initializer, Worker};
pub use keys::PropertyKeys;
pub use models::{JobSettings, SettingsPatch};
pub use runner::{LongRunner, RunOutcome};
pub use scheduler::{Clock, FakeClock, InMemoryScheduler, SystemClock, Trigger, TriggerScheduler};
pub use storage::{JsonPropertyStore, MemoryPropertyStore, PropertyStore};
