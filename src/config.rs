use anyhow::{Context, Result, bail};
use reconcile::Reconciler;
use remote::EntityKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_WORKSPACE_ROOT: &str = "~/confsync";

// ============================================================================
// Main Config Schema
// ============================================================================

/// The confsync configuration
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server connection
    #[serde(default)]
    pub server: ServerConfig,

    /// Extra fields to ignore per direction
    #[serde(default)]
    pub ignore: IgnoreConfig,

    /// Where entity folders live by default
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Base URL of the server API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Timeout for each request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Fields ignored on top of the built-in sets
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct IgnoreConfig {
    #[serde(default)]
    pub push: Vec<String>,

    #[serde(default)]
    pub pull: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Root for `<kind>/<id>` folders (supports ~ and $VARS)
    #[serde(default = "default_workspace_root")]
    pub root: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
        }
    }
}

fn default_workspace_root() -> String {
    DEFAULT_WORKSPACE_ROOT.to_string()
}

impl Config {
    /// Path of the config file
    pub fn path() -> Result<PathBuf> {
        Ok(paths::config_dir()?.join(CONFIG_FILE))
    }

    /// Load the config, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load the config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.timeout_secs == 0 {
            bail!("server.timeout_secs must be greater than 0");
        }
        if let Some(url) = &self.server.url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            bail!("server.url must start with http:// or https:// (got '{url}')");
        }
        if self.workspace.root.trim().is_empty() {
            bail!("workspace.root cannot be empty");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    /// Expanded workspace root
    pub fn workspace_root(&self) -> PathBuf {
        paths::expand(&self.workspace.root)
    }

    /// Default folder for an entity: `<workspace root>/<kind>/<id>`
    pub fn entity_folder(&self, kind: EntityKind, id: &str) -> PathBuf {
        self.workspace_root().join(kind.as_str()).join(id)
    }

    /// Reconciler with the configured extra ignores
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new().with_extra_ignores(&self.ignore.push, &self.ignore.pull)
    }
}
