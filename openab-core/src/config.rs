// ABOUTME: Configuration parsing from TOML file with environment variable overrides
// ABOUTME: Holds the [agent] section plus every backend section, with sensible defaults throughout
use crate::paths;
use anyhow::{Context, Result};
use openab_agent::{BackendKind, BackendsConfig, Env};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_VAR: &str = "OPENAB_CONFIG";
pub const AGENT_VAR: &str = "OPENAB_AGENT";
pub const WORKSPACE_VAR: &str = "OPENAB_WORKSPACE";
pub const TIMEOUT_VAR: &str = "OPENAB_TIMEOUT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(flatten)]
    pub backends: BackendsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Active backend: "cursor", "codex", "gemini", "claude", "openclaw"
    #[serde(default)]
    pub backend: BackendKind,
    /// Working directory handed to the agent; defaults to the home directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            workspace: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    300 // 5 minutes default timeout
}

/// Expand tilde (~) to the home directory
/// Logs a warning if expansion fails and falls back to the original path
pub fn expand_tilde(path: &str, env: &Env) -> PathBuf {
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };
    match rest {
        Some(rest) => match env.home_dir() {
            Some(home) if rest.is_empty() => home,
            Some(home) => home.join(rest),
            None => {
                tracing::warn!(
                    path = %path,
                    "Failed to expand tilde in path: could not determine home directory"
                );
                PathBuf::from(path)
            }
        },
        None => PathBuf::from(path),
    }
}

impl Config {
    /// Find the config file, checking multiple locations in order:
    /// 1. OPENAB_CONFIG env var (if set and the file exists)
    /// 2. ./config.toml (current directory - for development)
    /// 3. ~/.config/openab/config.toml (XDG config dir)
    pub fn find_config_file(env: &Env) -> Option<PathBuf> {
        if let Some(env_path) = env.get(CONFIG_PATH_VAR) {
            let path = PathBuf::from(env_path);
            if path.exists() {
                return Some(path);
            }
            tracing::warn!(path = %path.display(), "{CONFIG_PATH_VAR} points to a missing file");
        }

        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        let xdg_config = paths::config_file();
        if xdg_config.exists() {
            return Some(xdg_config);
        }

        None
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration TOML")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load configuration with overrides from the current process environment
    pub fn load() -> Result<Self> {
        Self::load_with_env(&Env::from_process())
    }

    pub fn load_with_env(env: &Env) -> Result<Self> {
        let mut config = match Self::find_config_file(env) {
            Some(config_path) => {
                tracing::info!(
                    path = %config_path.display(),
                    "Loading configuration from file"
                );
                Self::from_file(&config_path)?
            }
            None => {
                tracing::info!("No config file found, using environment variables and defaults");
                Config::default()
            }
        };
        config.apply_env_overrides(env)?;
        Ok(config)
    }

    /// Apply OPENAB_AGENT, OPENAB_WORKSPACE and OPENAB_TIMEOUT on top of file values
    pub fn apply_env_overrides(&mut self, env: &Env) -> Result<()> {
        if let Some(val) = env.get(AGENT_VAR) {
            match val.parse::<BackendKind>() {
                Ok(kind) => self.agent.backend = kind,
                Err(e) => tracing::warn!(value = %val, error = %e, "Ignoring {AGENT_VAR}"),
            }
        }
        if let Some(val) = env.get(WORKSPACE_VAR) {
            self.agent.workspace = Some(val.to_string());
        }
        if let Some(val) = env.get(TIMEOUT_VAR) {
            self.agent.timeout_secs = val.parse().with_context(|| {
                format!("{TIMEOUT_VAR} must be a whole number of seconds, got: {val}")
            })?;
        }
        Ok(())
    }

    pub fn backend(&self) -> BackendKind {
        self.agent.backend
    }

    /// Configured workspace with tilde expanded, else the home directory
    pub fn resolve_workspace(&self, env: &Env) -> Option<PathBuf> {
        match self.agent.workspace.as_deref().map(str::trim) {
            Some(ws) if !ws.is_empty() => Some(expand_tilde(ws, env)),
            _ => env.home_dir(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.agent.timeout_secs)
    }
}
