//! TOML Configuration File Support
//!
//! Configuration loading for the triage client, supporting a TOML file at
//! `~/.config/triage/triage.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:8000"
//! timeout_secs = 60
//!
//! [conversation]
//! default_top_k = 4
//! evidence_visible = false
//! stale_responses = "discard"
//!
//! [audit]
//! enabled = true
//! path = "/var/log/triage/interactions.jsonl"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conductor::{ConductorConfig, StaleResponsePolicy};
use crate::session::{is_supported_top_k, DEFAULT_TOP_K, SUPPORTED_TOP_K};

/// Backend used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Request timeout used when nothing else is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Base URL of the answer service
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Conversation section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationToml {
    /// Retrieval breadth at session start
    pub default_top_k: Option<u32>,

    /// Whether the evidence panel starts visible
    pub evidence_visible: Option<bool>,

    /// What to do with responses that outlive a clear
    pub stale_responses: Option<StaleResponsePolicy>,
}

/// Audit section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditToml {
    /// Whether to write the interaction log
    pub enabled: Option<bool>,

    /// Log file path
    pub path: Option<PathBuf>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageToml {
    /// Backend configuration section
    pub backend: BackendToml,

    /// Conversation configuration section
    pub conversation: ConversationToml,

    /// Audit configuration section
    pub audit: AuditToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Effective configuration for one run
///
/// Use [`load_config`] to load it with proper priority handling.
#[derive(Clone, Debug)]
pub struct TriageConfig {
    /// Base URL of the answer service
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// Retrieval breadth at session start
    pub default_top_k: u32,

    /// Whether the evidence panel starts visible
    pub evidence_visible: bool,

    /// What to do with responses that outlive a clear
    pub stale_responses: StaleResponsePolicy,

    /// Interaction log path, `None` when auditing is off
    pub audit_log: Option<PathBuf>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_top_k: DEFAULT_TOP_K,
            evidence_visible: false,
            stale_responses: StaleResponsePolicy::Discard,
            audit_log: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl TriageConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_supported_top_k(self.default_top_k) {
            return Err(ConfigError::ValidationError(format!(
                "default_top_k must be one of {SUPPORTED_TOP_K:?}, got {}",
                self.default_top_k
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Settings the Conductor needs
    #[must_use]
    pub fn conductor_config(&self) -> ConductorConfig {
        ConductorConfig {
            default_top_k: self.default_top_k,
            evidence_visible: self.evidence_visible,
            request_timeout: self.request_timeout,
            stale_responses: self.stale_responses,
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/triage/triage.toml` or
/// `~/.config/triage/triage.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("triage").join("triage.toml"))
}

/// Default interaction log path, used when auditing is enabled without one
#[must_use]
pub fn default_audit_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("triage").join("interactions.jsonl"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<TriageConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<TriageConfig, ConfigError> {
    let mut config = TriageConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: TriageToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut TriageConfig, toml: &TriageToml) {
    if let Some(ref url) = toml.backend.base_url {
        config.base_url.clone_from(url);
    }
    if let Some(secs) = toml.backend.timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }

    if let Some(top_k) = toml.conversation.default_top_k {
        config.default_top_k = top_k;
    }
    if let Some(visible) = toml.conversation.evidence_visible {
        config.evidence_visible = visible;
    }
    if let Some(policy) = toml.conversation.stale_responses {
        config.stale_responses = policy;
    }

    match (toml.audit.enabled, &toml.audit.path) {
        (Some(false), _) => config.audit_log = None,
        (_, Some(path)) => config.audit_log = Some(path.clone()),
        (Some(true), None) => config.audit_log = default_audit_path(),
        (None, None) => {}
    }
}

/// Apply environment variables, looked up through `var`
fn apply_env_config(config: &mut TriageConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var("TRIAGE_BASE_URL") {
        config.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = var("TRIAGE_TIMEOUT_SECS") {
        if let Ok(secs) = timeout.parse::<u64>() {
            config.request_timeout = Duration::from_secs(secs);
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %timeout, "Ignoring unparseable TRIAGE_TIMEOUT_SECS");
        }
    }
    if let Some(top_k) = var("TRIAGE_TOPK") {
        if let Ok(n) = top_k.parse::<u32>() {
            config.default_top_k = n;
            config.source = ConfigSource::Env;
        } else {
            tracing::warn!(value = %top_k, "Ignoring unparseable TRIAGE_TOPK");
        }
    }
    if let Some(policy) = var("TRIAGE_STALE_RESPONSES") {
        match policy.parse::<StaleResponsePolicy>() {
            Ok(p) => {
                config.stale_responses = p;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!("Ignoring TRIAGE_STALE_RESPONSES: {}", e),
        }
    }
    if let Some(path) = var("TRIAGE_AUDIT_LOG") {
        config.audit_log = if path.is_empty() {
            None
        } else {
            Some(PathBuf::from(path))
        };
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Base URL override
    pub base_url: Option<String>,

    /// Retrieval breadth override
    pub top_k: Option<u32>,

    /// Timeout override (seconds)
    pub timeout_secs: Option<u64>,

    /// Audit log path override
    pub audit_log: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL override
    #[must_use]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Set retrieval breadth override
    #[must_use]
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set timeout override
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set audit log override
    #[must_use]
    pub fn with_audit_log(mut self, path: PathBuf) -> Self {
        self.audit_log = Some(path);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut TriageConfig) {
        if self.base_url.is_some()
            || self.top_k.is_some()
            || self.timeout_secs.is_some()
            || self.audit_log.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.base_url {
            config.base_url.clone_from(url);
        }
        if let Some(top_k) = self.top_k {
            config.default_top_k = top_k;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ref path) = self.audit_log {
            config.audit_log = Some(path.clone());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn parse(toml_content: &str) -> TriageConfig {
        let toml_config: TriageToml = toml::from_str(toml_content).unwrap();
        let mut config = TriageConfig::default();
        apply_toml_config(&mut config, &toml_config);
        config
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = TriageConfig::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.default_top_k, 4);
        assert!(!config.evidence_visible);
        assert_eq!(config.stale_responses, StaleResponsePolicy::Discard);
        assert!(config.audit_log.is_none());
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.ends_with("triage/triage.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let config = parse(
            r#"
[backend]
base_url = "https://rag.example.com"
timeout_secs = 15

[conversation]
default_top_k = 6
evidence_visible = true
stale_responses = "append"

[audit]
path = "/tmp/triage/interactions.jsonl"
"#,
        );

        assert_eq!(config.base_url, "https://rag.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.default_top_k, 6);
        assert!(config.evidence_visible);
        assert_eq!(config.stale_responses, StaleResponsePolicy::Append);
        assert_eq!(
            config.audit_log,
            Some(PathBuf::from("/tmp/triage/interactions.jsonl"))
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = parse("[conversation]\ndefault_top_k = 2\n");
        assert_eq!(config.default_top_k, 2);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_audit_disabled_wins_over_path() {
        let config = parse("[audit]\nenabled = false\npath = \"/tmp/x.jsonl\"\n");
        assert!(config.audit_log.is_none());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[backend\nbase_url = ").unwrap();

        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_unknown_policy_is_an_error() {
        let result: Result<TriageToml, _> =
            toml::from_str("[conversation]\nstale_responses = \"keep\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_tracks_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[backend]\ntimeout_secs = 5\n").unwrap();

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config =
            load_config_from_path(Some(PathBuf::from("/nonexistent/triage.toml"))).unwrap();
        assert!(config.config_file_path.is_none());
    }

    // =========================================================================
    // Environment Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        let mut config = parse("[backend]\nbase_url = \"http://file:8000\"\n");
        apply_env_config(
            &mut config,
            env(&[
                ("TRIAGE_BASE_URL", "http://env:9000"),
                ("TRIAGE_TOPK", "3"),
                ("TRIAGE_STALE_RESPONSES", "append"),
            ]),
        );

        assert_eq!(config.base_url, "http://env:9000");
        assert_eq!(config.default_top_k, 3);
        assert_eq!(config.stale_responses, StaleResponsePolicy::Append);
        assert_eq!(config.source(), ConfigSource::Env);
    }

    #[test]
    fn test_unparseable_env_is_ignored() {
        let mut config = TriageConfig::default();
        apply_env_config(
            &mut config,
            env(&[("TRIAGE_TOPK", "lots"), ("TRIAGE_TIMEOUT_SECS", "soon")]),
        );

        assert_eq!(config.default_top_k, 4);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.source(), ConfigSource::Default);
    }

    #[test]
    fn test_empty_audit_env_disables() {
        let mut config = parse("[audit]\npath = \"/tmp/x.jsonl\"\n");
        apply_env_config(&mut config, env(&[("TRIAGE_AUDIT_LOG", "")]));
        assert!(config.audit_log.is_none());
    }

    // =========================================================================
    // CLI Override Tests
    // =========================================================================

    #[test]
    fn test_cli_overrides_everything() {
        let mut config = TriageConfig::default();
        apply_env_config(&mut config, env(&[("TRIAGE_TOPK", "3")]));

        ConfigOverrides::new()
            .with_top_k(5)
            .with_base_url("https://cli.example.com".to_string())
            .with_timeout_secs(10)
            .apply(&mut config);

        assert_eq!(config.default_top_k, 5);
        assert_eq!(config.base_url, "https://cli.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_empty_overrides_keep_source() {
        let mut config = TriageConfig::default();
        ConfigOverrides::new().apply(&mut config);
        assert_eq!(config.source(), ConfigSource::Default);
    }

    // =========================================================================
    // Validation Tests
    // =========================================================================

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_top_k = TriageConfig {
            default_top_k: 7,
            ..Default::default()
        };
        assert!(matches!(
            bad_top_k.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let zero_timeout = TriageConfig {
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());

        let bad_url = TriageConfig {
            base_url: "localhost:8000".to_string(),
            ..Default::default()
        };
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn test_conductor_config() {
        let config = TriageConfig {
            default_top_k: 2,
            evidence_visible: true,
            ..Default::default()
        };
        let conductor = config.conductor_config();
        assert_eq!(conductor.default_top_k, 2);
        assert!(conductor.evidence_visible);
        assert_eq!(conductor.request_timeout, Duration::from_secs(60));
    }
}
