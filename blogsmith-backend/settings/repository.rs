use anyhow::Result;
use async_trait::async_trait;

/// String key/value settings. Keys are created lazily on first write.
#[async_trait]
pub trait SettingRepository: Send + Sync {
    async fn get(&self, key: &str, default: &str) -> Result<String>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
