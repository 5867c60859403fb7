use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::repository::SettingRepository;

/// All settings in a single `settings.yaml`, loaded on first access.
pub struct YamlSettingRepository {
    path: PathBuf,
    cache: RwLock<Option<BTreeMap<String, String>>>,
}

impl YamlSettingRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            path: base_dir.as_ref().join("settings.yaml"),
            cache: RwLock::new(None),
        }
    }

    fn read_file(&self) -> Result<BTreeMap<String, String>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()));
            }
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    fn write_file(&self, settings: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(settings).context("failed to encode settings")?;
        let tmp_path = self.path.with_extension("yaml.tmp");
        std::fs::write(&tmp_path, yaml)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to rename into {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl SettingRepository for YamlSettingRepository {
    async fn get(&self, key: &str, default: &str) -> Result<String> {
        if let Some(ref settings) = *self.cache.read().await {
            return Ok(settings.get(key).cloned().unwrap_or_else(|| default.to_string()));
        }
        let settings = self.read_file()?;
        let value = settings.get(key).cloned().unwrap_or_else(|| default.to_string());
        *self.cache.write().await = Some(settings);
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut cache = self.cache.write().await;
        let mut settings = match cache.as_ref() {
            Some(s) => s.clone(),
            None => self.read_file()?,
        };
        settings.insert(key.to_string(), value.to_string());
        self.write_file(&settings)?;
        *cache = Some(settings);
        tracing::info!(key, "setting saved");
        Ok(())
    }
}
