use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::executor::DEFAULT_CONCURRENCY_LIMIT;

/// Settings for the default curl transport (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Total per-request timeout in seconds. Unset means no limit beyond the
    /// caller's cancellation token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Follow HTTP redirects.
    pub follow_redirects: bool,
    /// Redirect hop limit when `follow_redirects` is set.
    pub max_redirections: u32,
    /// Optional `User-Agent` header sent with every request.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: None,
            follow_redirects: true,
            max_redirections: 10,
            user_agent: None,
        }
    }
}

/// Global configuration loaded from `~/.config/httpbulk/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Maximum simultaneous in-flight requests per executor (0 or negative = unbounded).
    pub concurrency_limit: i64,
    /// Optional transport settings; if missing, built-in defaults are used.
    #[serde(default)]
    pub transport: Option<TransportConfig>,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            transport: None,
        }
    }
}

impl BulkConfig {
    /// Transport settings, falling back to defaults when the section is absent.
    pub fn transport_or_default(&self) -> TransportConfig {
        self.transport.clone().unwrap_or_default()
    }
}

/// `$XDG_CONFIG_HOME/httpbulk/config.toml`, creating the directory if needed.
pub fn config_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("httpbulk").context("resolve XDG directories")?;
    dirs.place_config_file("config.toml")
        .context("create httpbulk config directory")
}

/// Load the user's config file, writing the defaults there on first use.
pub fn load_or_init() -> Result<BulkConfig> {
    load_or_init_at(&config_path()?)
}

/// Load `path`, or write [`BulkConfig::default`] to it when it does not exist yet.
pub fn load_or_init_at(path: &Path) -> Result<BulkConfig> {
    if path.exists() {
        return load_from_path(path);
    }
    let cfg = BulkConfig::default();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let body = toml::to_string_pretty(&cfg).context("serialize default config")?;
    fs::write(path, body).with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote default httpbulk config");
    Ok(cfg)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<BulkConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BulkConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
