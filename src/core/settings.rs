use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::{
    EngineConfig, DEFAULT_ALLOWED_ORIGINS, DEFAULT_SERVER_PORT, PROJECT_DIRS,
};

const CONFIG_FILE: &str = "config.json";

/// Knobs the host application may adjust.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineSettings {
    /// Overrides the built-in remote base URL when set.
    pub remote_base_url: Option<String>,
    /// Overrides the platform-default mirror directory when set.
    pub mirror_dir: Option<PathBuf>,
    pub server_port: u16,
    /// Run a synchronization pass automatically on startup.
    pub auto_sync: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            remote_base_url: None,
            mirror_dir: None,
            server_port: DEFAULT_SERVER_PORT,
            auto_sync: true,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|origin| origin.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PersistedSettings {
    settings: EngineSettings,
    last_synced: Option<OffsetDateTime>,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            settings: EngineSettings::default(),
            last_synced: None,
        }
    }
}

pub struct SettingsManager {
    path: PathBuf,
    inner: RwLock<PersistedSettings>,
}

impl SettingsManager {
    pub fn new() -> Self {
        let config_path = resolve_config_path().expect("failed to resolve config directory");
        Self::with_path(config_path)
    }

    /// Back the manager with an explicit file, bypassing the platform
    /// config dir. Used by embedders with their own layout and by tests.
    pub fn with_path(path: PathBuf) -> Self {
        let persisted = load_settings(&path).unwrap_or_default();
        Self {
            path,
            inner: RwLock::new(persisted),
        }
    }

    pub fn read(&self) -> EngineSettings {
        self.inner.read().settings.clone()
    }

    pub fn write(&self, settings: EngineSettings) -> Result<()> {
        let mut guard = self.inner.write();
        guard.settings = settings;
        persist_settings(self.path.as_path(), &guard)
    }

    pub fn last_synced(&self) -> Option<OffsetDateTime> {
        self.inner.read().last_synced
    }

    pub fn set_last_synced(&self, when: OffsetDateTime) -> Result<()> {
        let mut guard = self.inner.write();
        guard.last_synced = Some(when);
        persist_settings(self.path.as_path(), &guard)
    }

    /// Defaults with the persisted overrides applied.
    pub fn effective_config(&self) -> EngineConfig {
        let settings = self.read();
        let mut config = EngineConfig::default();
        if let Some(url) = settings.remote_base_url {
            config.remote_base_url = url;
        }
        if let Some(dir) = settings.mirror_dir {
            config.mirror_dir = dir;
        }
        config.server_port = settings.server_port;
        config.allowed_origins = settings.allowed_origins;
        config
    }
}

fn resolve_config_path() -> Result<PathBuf> {
    let project_dirs = PROJECT_DIRS
        .as_ref()
        .context("missing project directories")?;
    let dir = project_dirs.config_dir();
    fs::create_dir_all(dir).context("creating config directory failed")?;
    Ok(dir.join(CONFIG_FILE))
}

fn load_settings(path: &Path) -> Result<PersistedSettings> {
    if !path.exists() {
        return Ok(PersistedSettings::default());
    }
    let bytes = fs::read(path).with_context(|| format!("failed reading {path:?}"))?;
    serde_json::from_slice(&bytes).context("config json could not be parsed")
}

fn persist_settings(path: &Path, settings: &PersistedSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {parent:?}"))?;
    }
    let serialized =
        serde_json::to_vec_pretty(settings).context("serialize settings to json failed")?;
    fs::write(path, serialized).with_context(|| format!("write settings to {path:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_flow_into_effective_config() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SettingsManager::with_path(dir.path().join(CONFIG_FILE));

        let mut settings = manager.read();
        settings.remote_base_url = Some("https://staging.neuvo.ai/view".into());
        settings.server_port = 0;
        manager.write(settings).unwrap();

        let config = manager.effective_config();
        assert_eq!(config.remote_base_url, "https://staging.neuvo.ai/view");
        assert_eq!(config.server_port, 0);

        // Round-trips through the file.
        let reloaded = SettingsManager::with_path(dir.path().join(CONFIG_FILE));
        assert_eq!(
            reloaded.read().remote_base_url.as_deref(),
            Some("https://staging.neuvo.ai/view")
        );
    }
}
