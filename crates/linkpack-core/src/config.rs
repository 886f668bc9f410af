use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Outbound fetch parameters (optional `[fetch]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of redirects followed per link.
    pub max_redirections: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 600,
            max_redirections: 10,
        }
    }
}

/// Global configuration loaded from `~/.config/linkpack/config.toml` or an explicit path.
/// Every key is optional; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkpackConfig {
    /// Listening port for the HTTP front end.
    pub port: u16,
    /// File extensions a link may carry, matched case-insensitively (e.g. ".pdf").
    pub allowed_extensions: Vec<String>,
    /// Maximum number of tasks building at once; also the admission limit.
    pub max_tasks: usize,
    /// Number of links that completes a task and triggers its build.
    pub max_links_per_task: usize,
    /// Directory where finished archives are stored.
    pub archive_dir: PathBuf,
    /// Base URL reported in `archive_location`. Defaults to `http://localhost:{port}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    pub fetch: FetchConfig,
}

impl Default for LinkpackConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            allowed_extensions: vec![".pdf".to_string(), ".jpeg".to_string()],
            max_tasks: 3,
            max_links_per_task: 3,
            archive_dir: PathBuf::from("archives"),
            public_url: None,
            fetch: FetchConfig::default(),
        }
    }
}

impl LinkpackConfig {
    /// Base URL for archive locations, without a trailing slash.
    pub fn public_base_url(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }

    /// Clamp limits to at least 1 so the scheduler and quota are never empty.
    pub fn normalized(mut self) -> Self {
        self.max_tasks = self.max_tasks.max(1);
        self.max_links_per_task = self.max_links_per_task.max(1);
        self
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("linkpack")?;
    Ok(xdg_dirs.get_config_home().join("config.toml"))
}

/// Load configuration from `path`, or return defaults if the file does not exist.
pub fn load_from_path(path: &Path) -> Result<LinkpackConfig> {
    if !path.exists() {
        tracing::info!("no config at {}, using defaults", path.display());
        return Ok(LinkpackConfig::default());
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let cfg: LinkpackConfig = toml::from_str(&data)
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg.normalized())
}

/// Load configuration from the XDG config path, falling back to defaults.
pub fn load_default() -> Result<LinkpackConfig> {
    load_from_path(&config_path()?)
}
