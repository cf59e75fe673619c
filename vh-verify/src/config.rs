//! Credential resolution for vh-verify
//!
//! Resolves one API key per backend into an explicit [`Credentials`] object
//! that is handed to the clients at construction. Nothing reads the process
//! environment after startup.
//!
//! **Priority per backend:** ENV (`VH_<NAME>_API_KEY`, then legacy `<NAME>_API_KEY`) → TOML

use crate::models::Backend;
use tracing::{info, warn};
use vh_common::config::TomlConfig;

/// One API key per backend; `None` means that backend is not configured
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub consensus: Option<String>,
    pub perplexity: Option<String>,
    pub openai: Option<String>,
}

// Keys never reach logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consensus", &self.consensus.as_ref().map(|_| "<set>"))
            .field("perplexity", &self.perplexity.as_ref().map(|_| "<set>"))
            .field("openai", &self.openai.as_ref().map(|_| "<set>"))
            .finish()
    }
}

impl Credentials {
    /// Resolve all three keys from the environment and TOML config
    pub fn resolve(toml_config: &TomlConfig) -> Self {
        Self {
            consensus: resolve_api_key(Backend::Consensus, toml_config.consensus.api_key.as_deref()),
            perplexity: resolve_api_key(
                Backend::Perplexity,
                toml_config.perplexity.api_key.as_deref(),
            ),
            openai: resolve_api_key(Backend::OpenAi, toml_config.openai.api_key.as_deref()),
        }
    }

    pub fn get(&self, backend: Backend) -> Option<&str> {
        match backend {
            Backend::Consensus => self.consensus.as_deref(),
            Backend::Perplexity => self.perplexity.as_deref(),
            Backend::OpenAi => self.openai.as_deref(),
        }
    }

    /// Backends with no usable key
    pub fn missing(&self) -> Vec<Backend> {
        Backend::ALL
            .into_iter()
            .filter(|b| self.get(*b).is_none())
            .collect()
    }
}

/// Environment variables checked for a backend, in priority order
pub fn env_var_names(backend: Backend) -> [&'static str; 2] {
    match backend {
        Backend::Consensus => ["VH_CONSENSUS_API_KEY", "CONSENSUS_API_KEY"],
        Backend::Perplexity => ["VH_PERPLEXITY_API_KEY", "PERPLEXITY_API_KEY"],
        Backend::OpenAi => ["VH_OPENAI_API_KEY", "OPENAI_API_KEY"],
    }
}

/// Resolve one backend key from ENV then TOML
///
/// A missing key is not an error here: it is a configuration problem local
/// to that backend, reported per call as a sentinel result.
pub fn resolve_api_key(backend: Backend, toml_key: Option<&str>) -> Option<String> {
    let env_key = env_var_names(backend)
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|k| is_valid_key(k)));

    let toml_key = toml_key.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            backend = %backend,
            "API key found in both environment and TOML. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!(backend = %backend, "API key loaded from environment variable");
        return Some(key.trim().to_string());
    }

    if let Some(key) = toml_key {
        info!(backend = %backend, "API key loaded from TOML config");
        return Some(key.trim().to_string());
    }

    warn!(
        backend = %backend,
        "API key not configured; set {} or [{}] api_key in TOML. Results from this backend will be placeholders.",
        env_var_names(backend)[0],
        backend.as_str().to_lowercase()
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
