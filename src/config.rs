//! Configuration loader and validator for the Cascade batch workflows.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const APPTEST_BASE_URL: &str = "https://cascadeapptest.csi.edu:8443/api/v1";
const PROD_BASE_URL: &str = "https://cascade.csi.edu:8443/api/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("Missing configuration section: {0}")]
    MissingSection(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub global: Global,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_rename: Option<WorkflowSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sitemap: Option<WorkflowSettings>,
}

/// Settings shared by every workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Global {
    pub api_key: String,
    pub platform: Platform,
    /// Overrides the URL implied by `platform`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Route requests through `HTTP_PROXY`/`HTTPS_PROXY` when set.
    #[serde(default = "default_use_system_proxy")]
    pub use_system_proxy: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Apptest,
    Prod,
}

impl Platform {
    pub fn base_url(&self) -> &'static str {
        match self {
            Platform::Apptest => APPTEST_BASE_URL,
            Platform::Prod => PROD_BASE_URL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Apptest => "apptest",
            Platform::Prod => "prod",
        }
    }
}

/// Per-workflow settings (`image_rename` and `sitemap` sections).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub csv_path: String,
    pub cascade_site: String,
    pub asset_type: String,
}

/// Which workflow section of the config a run reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    ImageRename,
    Sitemap,
}

impl Workflow {
    pub fn section(&self) -> &'static str {
        match self {
            Workflow::ImageRename => "image_rename",
            Workflow::Sitemap => "sitemap",
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_dir() -> String {
    ".".into()
}

fn default_use_system_proxy() -> bool {
    true
}

impl Config {
    /// Base URL of the CMS API; `global.base_url` wins over the platform default.
    pub fn base_url(&self) -> &str {
        self.global
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.global.platform.base_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.global.request_timeout_secs)
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.global.log_dir)
    }

    /// Settings for `workflow`, or `MissingSection` if the file has none.
    pub fn workflow(&self, workflow: Workflow) -> Result<&WorkflowSettings, ConfigError> {
        let section = match workflow {
            Workflow::ImageRename => self.image_rename.as_ref(),
            Workflow::Sitemap => self.sitemap.as_ref(),
        };
        section.ok_or(ConfigError::MissingSection(workflow.section()))
    }

    /// Ensure the run-log directory exists.
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.global.log_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.global.log_dir)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.global.api_key.trim().is_empty() {
        return Err(ConfigError::Invalid("global.api_key must be non-empty"));
    }
    if let Some(url) = &cfg.global.base_url {
        if url.trim().is_empty() {
            return Err(ConfigError::Invalid("global.base_url must be non-empty when set"));
        }
    }
    if cfg.global.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid("global.request_timeout_secs must be > 0"));
    }

    if let Some(section) = &cfg.image_rename {
        validate_section(
            section,
            [
                "image_rename.csv_path must be non-empty",
                "image_rename.cascade_site must be non-empty",
                "image_rename.asset_type must be non-empty",
            ],
        )?;
    }
    if let Some(section) = &cfg.sitemap {
        validate_section(
            section,
            [
                "sitemap.csv_path must be non-empty",
                "sitemap.cascade_site must be non-empty",
                "sitemap.asset_type must be non-empty",
            ],
        )?;
    }

    Ok(())
}

fn validate_section(
    section: &WorkflowSettings,
    messages: [&'static str; 3],
) -> Result<(), ConfigError> {
    let [csv_path, site, asset_type] = messages;
    if section.csv_path.trim().is_empty() {
        return Err(ConfigError::Invalid(csv_path));
    }
    if section.cascade_site.trim().is_empty() {
        return Err(ConfigError::Invalid(site));
    }
    if section.asset_type.trim().is_empty() {
        return Err(ConfigError::Invalid(asset_type));
    }
    Ok(())
}

/// Returns an example YAML configuration covering both workflows.
pub fn example() -> &'static str {
    r#"global:
  api_key: "YOUR_CASCADE_API_KEY"
  platform: apptest

image_rename:
  csv_path: "./image_rename.csv"
  cascade_site: "www"
  asset_type: "file"

sitemap:
  csv_path: "./sitemap.csv"
  cascade_site: "www"
  asset_type: "page"
"#
}
