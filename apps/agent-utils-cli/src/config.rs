use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_MODULE_ROOT: &str = "jivas/agent_utils_action";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_CONFIG: &str = "AGENT_UTILS_CONFIG";
const ENV_BASE_URL: &str = "AGENT_UTILS_BASE_URL";
const ENV_TOKEN: &str = "AGENT_UTILS_TOKEN";
const ENV_AGENT_ID: &str = "AGENT_UTILS_AGENT_ID";

/// On-disk configuration (`config.toml`). Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub module_root: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Connection flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (TOML); falls back to AGENT_UTILS_CONFIG, then the per-user config dir
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Base URL of the agent service; falls back to AGENT_UTILS_BASE_URL
    #[arg(long, global = true)]
    pub base: Option<String>,
    /// Session token; falls back to AGENT_UTILS_TOKEN
    #[arg(long, global = true)]
    pub token: Option<String>,
    /// Agent to operate on; falls back to AGENT_UTILS_AGENT_ID
    #[arg(long, global = true)]
    pub agent_id: Option<String>,
    /// Action module that serves the agent utility walkers
    #[arg(long, global = true)]
    pub module_root: Option<String>,
    /// Request timeout (seconds)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

/// Effective settings after layering flags, environment, file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub token: Option<String>,
    pub agent_id: Option<String>,
    pub module_root: String,
    pub timeout: Duration,
}

impl Settings {
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let file = match explicit_config_path(args) {
            Some(path) => load_file(&path)?,
            None => match default_config_path().filter(|path| path.exists()) {
                Some(path) => load_file(&path)?,
                None => FileConfig::default(),
            },
        };
        Ok(Self::resolve(args, file))
    }

    /// Precedence per key: flag, environment, config file, default.
    pub fn resolve(args: &GlobalArgs, file: FileConfig) -> Self {
        let base_url = first_non_empty([args.base.clone(), env_var(ENV_BASE_URL), file.base_url])
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = first_non_empty([args.token.clone(), env_var(ENV_TOKEN), file.token]);
        let agent_id = first_non_empty([
            args.agent_id.clone(),
            env_var(ENV_AGENT_ID),
            file.agent_id,
        ]);
        let module_root = first_non_empty([args.module_root.clone(), file.module_root])
            .unwrap_or_else(|| DEFAULT_MODULE_ROOT.to_string());
        let timeout_secs = args
            .timeout
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            agent_id,
            module_root,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn require_agent_id(&self) -> Result<&str> {
        match self.agent_id.as_deref() {
            Some(id) => Ok(id),
            None => bail!("no agent selected: pass --agent-id or set {ENV_AGENT_ID}"),
        }
    }
}

pub fn load_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "agent-utils")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn explicit_config_path(args: &GlobalArgs) -> Option<PathBuf> {
    args.config
        .clone()
        .or_else(|| env_var(ENV_CONFIG).map(PathBuf::from))
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
