//! UI preferences persisted as one JSON record on disk.

use anyhow::{Context, Result};
use dex_core::{Tab, Theme, UiPreferences};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

pub const STORAGE_KEY: &str = "rise-dex-storage";
const RECORD_VERSION: u32 = 0;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    theme: Theme,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedRecord {
    state: PersistedState,
    version: u32,
}

/// Holds the active tab in memory and the theme on disk.
pub struct PreferenceStore {
    path: PathBuf,
    prefs: RwLock<UiPreferences>,
}

impl PreferenceStore {
    pub fn record_path(dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", STORAGE_KEY))
    }

    /// Loads the record from `dir`. A missing or unreadable record falls back
    /// to defaults.
    pub async fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("create storage dir: {}", dir.display()))?;
        let path = Self::record_path(dir);
        let theme = match fs::read(&path).await {
            Ok(raw) => match serde_json::from_slice::<PersistedRecord>(&raw) {
                Ok(rec) => {
                    debug!(target: "prefs", path=%path.display(), version=rec.version, "preferences loaded");
                    rec.state.theme
                }
                Err(err) => {
                    warn!(target: "prefs", path=%path.display(), error=%err, "corrupt preference record, using defaults");
                    Theme::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Theme::default(),
            Err(err) => {
                warn!(target: "prefs", path=%path.display(), error=%err, "preference record unreadable, using defaults");
                Theme::default()
            }
        };
        Ok(Self {
            path,
            prefs: RwLock::new(UiPreferences {
                active_tab: Tab::default(),
                theme,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> UiPreferences {
        *self.prefs.read()
    }

    pub fn set_active_tab(&self, tab: Tab) {
        self.prefs.write().active_tab = tab;
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<()> {
        self.prefs.write().theme = theme;
        self.persist(theme).await?;
        info!(target: "prefs", theme=?theme, "theme saved");
        Ok(())
    }

    async fn persist(&self, theme: Theme) -> Result<()> {
        let record = PersistedRecord {
            state: PersistedState { theme },
            version: RECORD_VERSION,
        };
        let mut json = serde_json::to_vec(&record).context("serialize preferences")?;
        json.push(b'\n');
        let tmp_path = temp_path(&self.path);
        fs::write(&tmp_path, &json)
            .await
            .with_context(|| format!("write temp preferences: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("replace preferences: {}", self.path.display()))?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut os_string = path.as_os_str().to_os_string();
    os_string.push(".tmp");
    os_string.into()
}
