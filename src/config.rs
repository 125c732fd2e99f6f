use crate::Result;
use crate::query::ViewLimits;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../default_config.toml");

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Cap on repositories and events indexed per run when a submission
    /// doesn't carry its own limit
    #[serde(default = "default_max_items")]
    pub max_items: usize,

    /// Pause between successive page fetches, in milliseconds
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Timeout applied to each API request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User-Agent header sent with every API request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// How many ranked repositories the read view carries
    #[serde(default = "default_top_repos")]
    pub top_repos: usize,

    /// How many recent events the read view carries
    #[serde(default = "default_recent_events")]
    pub recent_events: usize,

    /// Upper bound on repository items scanned per subject for the read view
    #[serde(default = "default_repo_scan_limit")]
    pub repo_scan_limit: usize,
}

const fn default_max_items() -> usize {
    200
}

const fn default_page_delay_ms() -> u64 {
    200
}

const fn default_request_timeout_secs() -> u64 {
    20
}

fn default_user_agent() -> String {
    "octoindex/1.0".to_owned()
}

const fn default_top_repos() -> usize {
    10
}

const fn default_recent_events() -> usize {
    50
}

const fn default_repo_scan_limit() -> usize {
    2000
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading octoindex configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            // Look for octoindex.toml
            let path = base_dir.join("octoindex.toml");
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // No config file found, use defaults
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading octoindex configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Pause between successive page fetches.
    #[must_use]
    pub const fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// Timeout applied to each API request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read-view bounds.
    #[must_use]
    pub const fn view_limits(&self) -> ViewLimits {
        ViewLimits {
            top_repos: self.top_repos,
            recent_events: self.recent_events,
            repo_scan_limit: self.repo_scan_limit,
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if any limit is zero or the user agent is empty
    fn validate(&self) -> Result<()> {
        if self.max_items == 0 {
            return Err(app_err!("max_items must be at least 1"));
        }

        if self.repo_scan_limit == 0 {
            return Err(app_err!("repo_scan_limit must be at least 1"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(app_err!("user_agent must not be empty"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
