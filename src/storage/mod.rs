pub mod json;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

pub use json::JsonPropertyStore;
pub use memory::MemoryPropertyStore;

/// Durable string-keyed property store that survives across invocations.
///
/// The controller assumes read-after-write visibility within one invocation
/// and nothing more; there is no atomicity across keys.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Deleting an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<()>;
}
