//! Bootstrap configuration loading and config file resolution
//!
//! Configuration is a single TOML file read once at startup. Every section and
//! every field is optional; anything missing falls back to compiled defaults.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`VH_CONFIG`)
//! 3. `~/.config/verihealth/<module>.toml` (if it exists)
//! 4. Compiled defaults (no file)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VH_CONFIG";

/// Bootstrap configuration loaded from TOML file
///
/// Cannot change while the service is running.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port (None = compiled default)
    pub port: Option<u16>,

    pub logging: LoggingConfig,

    pub verification: VerificationConfig,

    pub consensus: ConsensusConfig,

    pub perplexity: PerplexityConfig,

    pub openai: OpenAiConfig,

    pub roster: RosterConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Aggregator-wide settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Ceiling for any single backend call
    pub timeout_seconds: u64,

    /// Claims verified at once during batch verification
    pub max_concurrent_claims: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            max_concurrent_claims: default_max_concurrent_claims(),
        }
    }
}

/// Literature-search backend settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Candidate papers requested per claim
    pub candidate_limit: u32,
    pub requests_per_second: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.consensus.app/v1".to_string(),
            candidate_limit: 5,
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Which response shape the retrieval-QA backend speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PerplexityMode {
    /// Chat completion returning free text (keyword heuristic)
    #[default]
    Chat,
    /// `/verify` endpoint returning a numeric score
    Structured,
}

/// Retrieval-QA backend settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PerplexityConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub mode: PerplexityMode,
    pub model: String,
    pub requests_per_second: u32,
}

impl Default for PerplexityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.perplexity.ai".to_string(),
            mode: PerplexityMode::Chat,
            model: "pplx-7b-chat".to_string(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Generative LLM backend settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub requests_per_second: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

/// Influencer roster source
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RosterConfig {
    /// JSON roster file (None = empty roster)
    pub path: Option<PathBuf>,
}

fn default_port() -> u16 {
    5780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_seconds() -> u64 {
    20
}

fn default_max_concurrent_claims() -> usize {
    4
}

fn default_requests_per_second() -> u32 {
    5
}

impl TomlConfig {
    /// Effective HTTP port
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(default_port)
    }
}

/// Locates the bootstrap config file for a module
pub struct ConfigFileResolver {
    module_name: String,
}

impl ConfigFileResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
        }
    }

    /// Resolve config file path by priority (CLI → ENV → user config dir)
    ///
    /// Returns None when no file applies; the caller then runs on compiled defaults.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        let user_config = self.default_path()?;
        if user_config.exists() {
            Some(user_config)
        } else {
            None
        }
    }

    /// `~/.config/verihealth/<module>.toml`
    pub fn default_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|d| {
            d.join("verihealth")
                .join(format!("{}.toml", self.module_name))
        })
    }
}

/// Load TOML config from an explicit path
///
/// A missing or malformed file is an error here; see [`load_or_default`]
/// for the forgiving variant used at startup.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let config: TomlConfig = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Load TOML config, falling back to defaults when no file is available
///
/// A file that exists but cannot be parsed is still an error: silently
/// ignoring a broken config would drop credentials without notice.
pub fn load_or_default(path: Option<&Path>) -> Result<TomlConfig> {
    match path {
        Some(path) if path.exists() => {
            let config = load_toml_config(path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            info!("No config file, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

fn validate(config: &TomlConfig) -> Result<()> {
    if config.verification.timeout_seconds == 0 {
        return Err(Error::Config(
            "verification.timeout_seconds must be greater than zero".to_string(),
        ));
    }
    if config.verification.max_concurrent_claims == 0 {
        return Err(Error::Config(
            "verification.max_concurrent_claims must be greater than zero".to_string(),
        ));
    }
    for (section, rps) in [
        ("consensus", config.consensus.requests_per_second),
        ("perplexity", config.perplexity.requests_per_second),
        ("openai", config.openai.requests_per_second),
    ] {
        if rps == 0 {
            return Err(Error::Config(format!(
                "{}.requests_per_second must be greater than zero",
                section
            )));
        }
    }
    Ok(())
}
