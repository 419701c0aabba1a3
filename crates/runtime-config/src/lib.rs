//! Persisted pipeline-ui settings.
//!
//! The CLI and TUI both read `pipeline-ui.toml` through these types and turn it
//! into a [`PipelineUiConfig`] with [`Settings::to_ui_config`]. Missing files
//! and missing keys fall back to defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pipeline_ui_core::config::{Features, Labels, LinkBuilders, PipelineUiConfig, url_template};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical config file name used by the CLI and TUI.
pub const CONFIG_FILE_NAME: &str = "pipeline-ui.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHome,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level settings (persisted as `pipeline-ui.toml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub links: LinkSettings,
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub polling: PollingSettings,
    #[serde(default)]
    pub live: LiveSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,
    /// Static headers sent with every REST request, e.g. `Authorization`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            headers: BTreeMap::new(),
        }
    }
}

/// URL templates. `{id}` is replaced by the identifier, `{url}` by the raw PR URL.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LinkSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollingSettings {
    #[serde(default = "default_sessions_interval_ms")]
    pub sessions_interval_ms: u64,
    #[serde(default = "default_detail_interval_ms")]
    pub detail_interval_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            sessions_interval_ms: default_sessions_interval_ms(),
            detail_interval_ms: default_detail_interval_ms(),
            page_size: default_page_size(),
        }
    }
}

impl PollingSettings {
    pub fn sessions_interval(&self) -> Duration {
        Duration::from_millis(self.sessions_interval_ms)
    }

    pub fn detail_interval(&self) -> Duration {
        Duration::from_millis(self.detail_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveSettings {
    #[serde(default = "default_false")]
    pub auto_reconnect: bool,
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            auto_reconnect: false,
            reconnect_interval_ms: default_reconnect_interval_ms(),
        }
    }
}

impl LiveSettings {
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_false() -> bool {
    false
}
fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_sessions_interval_ms() -> u64 {
    10_000
}
fn default_detail_interval_ms() -> u64 {
    5_000
}
fn default_page_size() -> u32 {
    20
}
fn default_reconnect_interval_ms() -> u64 {
    5_000
}

// ── Conversion ──────────────────────────────────────────────────────────

impl Settings {
    /// Build the library configuration from persisted settings.
    pub fn to_ui_config(&self) -> PipelineUiConfig {
        let mut config = PipelineUiConfig::new(self.server.url.trim());
        config.headers = self.server.headers.clone();
        config.websocket_url = self.links.websocket_url.as_deref().map(url_template);
        config.links = LinkBuilders {
            task_url: self.links.task_url.as_deref().map(url_template),
            pr_url: self.links.pr_url.as_deref().map(url_template),
            session_url: self.links.session_url.as_deref().map(url_template),
        };
        config.features = self.features;
        config.labels = self.labels.clone();
        config
    }
}

/// Normalize values that would make the client misbehave.
/// Returns true when any field was updated.
pub fn apply_compat_fallbacks(settings: &mut Settings) -> bool {
    let mut changed = false;

    let trimmed = settings.server.url.trim().trim_end_matches('/').to_string();
    if trimmed.is_empty() {
        settings.server.url = default_server_url();
        changed = true;
    } else if trimmed != settings.server.url {
        settings.server.url = trimmed;
        changed = true;
    }

    if settings.polling.page_size == 0 {
        settings.polling.page_size = default_page_size();
        changed = true;
    }

    // Blank templates behave like absent ones.
    for template in [
        &mut settings.links.task_url,
        &mut settings.links.pr_url,
        &mut settings.links.session_url,
        &mut settings.links.websocket_url,
    ] {
        if template.as_deref().is_some_and(|t| t.trim().is_empty()) {
            *template = None;
            changed = true;
        }
    }

    changed
}

// ── File I/O ────────────────────────────────────────────────────────────

pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".config").join("pipeline-ui"))
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load settings from `path`. A missing file yields defaults.
pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let mut settings: Settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    apply_compat_fallbacks(&mut settings);
    Ok(settings)
}

/// Load settings from the default location.
pub fn load() -> Result<Settings, ConfigError> {
    load_from(&default_config_path()?)
}

pub fn save_to(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save(settings: &Settings) -> Result<PathBuf, ConfigError> {
    let path = default_config_path()?;
    save_to(&path, settings)?;
    Ok(path)
}
