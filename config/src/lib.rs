//! Shroud Configuration
//!
//! Shared configuration crate for the bundle builder and the prover.
//!
//! Handles loading configuration from:
//! 1. SHROUD_CONFIG env var (explicit path)
//! 2. ./shroud.toml (current directory)
//! 3. ~/.shroud/shroud.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::{env, fs};

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<ShroudConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "shroud.toml";
const CONFIG_DIR_NAME: &str = ".shroud";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_MIN_ACTIONS: usize = 1;

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShroudConfig {
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub prover: ProverConfig,
}

/// Bundle builder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default = "default_true")]
    pub spends_enabled: bool,
    #[serde(default = "default_true")]
    pub outputs_enabled: bool,
    #[serde(default)]
    pub action_ordering: ActionOrdering,
    /// Lower bound on the number of actions after padding
    #[serde(default = "default_min_actions")]
    pub min_actions: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            spends_enabled: true,
            outputs_enabled: true,
            action_ordering: ActionOrdering::default(),
            min_actions: DEFAULT_MIN_ACTIONS,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_actions() -> usize {
    DEFAULT_MIN_ACTIONS
}

/// How spends and outputs are laid out across actions
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionOrdering {
    /// Each side is shuffled independently before pairing
    #[default]
    Randomized,
    /// Descriptors keep the order they were added in, dummies last
    InsertionOrder,
}

impl FromStr for ActionOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "randomized" | "random" => Ok(Self::Randomized),
            "insertion_order" | "insertion" => Ok(Self::InsertionOrder),
            other => Err(format!("unknown action ordering: {other}")),
        }
    }
}

impl fmt::Display for ActionOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Randomized => write!(f, "randomized"),
            Self::InsertionOrder => write!(f, "insertion_order"),
        }
    }
}

/// Prover configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverConfig {
    #[serde(default)]
    pub backend: ProverBackend,
    /// Size of a dedicated proving pool; the global rayon pool when unset
    #[serde(default)]
    pub worker_threads: Option<usize>,
    #[serde(default)]
    pub proving_key_path: Option<String>,
    #[serde(default)]
    pub verifying_key_path: Option<String>,
}

/// Proving backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProverBackend {
    #[default]
    Mock,
    Groth16,
}

impl FromStr for ProverBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "groth16" => Ok(Self::Groth16),
            other => Err(format!("unknown prover backend: {other}")),
        }
    }
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set Option<String> from env var if present
fn env_option_string(key: &str, field: &mut Option<String>) {
    if let Ok(v) = env::var(key) {
        *field = Some(v);
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => tracing::warn!(key, value = %v, "ignoring unparseable environment override"),
        }
    }
}

/// Set Option<T> from env var if present and parseable
fn env_parse_option<T: FromStr>(key: &str, field: &mut Option<T>) {
    if let Ok(v) = env::var(key) {
        match v.parse() {
            Ok(parsed) => *field = Some(parsed),
            Err(_) => tracing::warn!(key, value = %v, "ignoring unparseable environment override"),
        }
    }
}

/// Check if env var is set to a truthy value ("1" or "true")
fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Implementation
// ============================================================================

impl ShroudConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::parse_file(&path)?
            }
            None => {
                tracing::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check SHROUD_CONFIG env var
        if let Ok(path) = env::var("SHROUD_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            tracing::warn!("SHROUD_CONFIG points at missing file: {}", path.display());
        }

        // 2. Check ./shroud.toml (current directory)
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.shroud/shroud.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Builder
        if let Some(v) = env_bool("SHROUD_SPENDS_ENABLED") {
            self.builder.spends_enabled = v;
        }
        if let Some(v) = env_bool("SHROUD_OUTPUTS_ENABLED") {
            self.builder.outputs_enabled = v;
        }
        env_parse("SHROUD_ACTION_ORDERING", &mut self.builder.action_ordering);
        env_parse("SHROUD_MIN_ACTIONS", &mut self.builder.min_actions);

        // Prover
        env_parse("SHROUD_PROVER_BACKEND", &mut self.prover.backend);
        env_parse_option("SHROUD_WORKER_THREADS", &mut self.prover.worker_threads);
        env_option_string("SHROUD_PROVING_KEY", &mut self.prover.proving_key_path);
        env_option_string("SHROUD_VERIFYING_KEY", &mut self.prover.verifying_key_path);
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.prover.worker_threads = Some(4);
        sample.prover.proving_key_path = Some("./keys/action.pk".into());
        sample.prover.verifying_key_path = Some("./keys/action.vk".into());
        toml::to_string_pretty(&sample).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    ///
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static ShroudConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Try to get the global config instance.
    ///
    /// Returns `None` if config hasn't been initialized yet.
    pub fn try_global() -> Option<&'static ShroudConfig> {
        GLOBAL_CONFIG.get()
    }

    /// Initialize the global config with a specific instance.
    ///
    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: ShroudConfig) -> Result<(), ShroudConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

/// Shorthand for `ShroudConfig::global()`.
#[inline]
pub fn global_config() -> &'static ShroudConfig {
    ShroudConfig::global()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ShroudConfig::default();
        assert!(config.builder.spends_enabled);
        assert!(config.builder.outputs_enabled);
        assert_eq!(config.builder.action_ordering, ActionOrdering::Randomized);
        assert_eq!(config.builder.min_actions, DEFAULT_MIN_ACTIONS);
        assert_eq!(config.prover.backend, ProverBackend::Mock);
        assert!(config.prover.worker_threads.is_none());
    }

    #[test]
    fn test_generate_sample() {
        let sample = ShroudConfig::generate_sample();
        assert!(sample.contains("[builder]"));
        assert!(sample.contains("[prover]"));
    }

    #[test]
    fn test_parse_sample() {
        let sample = ShroudConfig::generate_sample();
        let parsed: ShroudConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.prover.worker_threads, Some(4));
        assert_eq!(parsed.builder, BuilderConfig::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: ShroudConfig = toml::from_str(
            r#"
            [builder]
            spends_enabled = false
            action_ordering = "insertion_order"

            [prover]
            backend = "groth16"
            "#,
        )
        .unwrap();

        assert!(!parsed.builder.spends_enabled);
        assert!(parsed.builder.outputs_enabled);
        assert_eq!(parsed.builder.action_ordering, ActionOrdering::InsertionOrder);
        assert_eq!(parsed.builder.min_actions, DEFAULT_MIN_ACTIONS);
        assert_eq!(parsed.prover.backend, ProverBackend::Groth16);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let parsed: Result<ShroudConfig, _> = toml::from_str("[prover]\nbackend = \"noir\"\n");
        assert!(parsed.is_err(), "unknown backends should not parse");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Groth16".parse::<ProverBackend>(), Ok(ProverBackend::Groth16));
        assert_eq!("insertion".parse::<ActionOrdering>(), Ok(ActionOrdering::InsertionOrder));
        assert!("sorted".parse::<ActionOrdering>().is_err());
        assert_eq!(
            ActionOrdering::InsertionOrder.to_string().parse::<ActionOrdering>(),
            Ok(ActionOrdering::InsertionOrder)
        );
    }

    #[test]
    fn test_load_from_file() {
        let path = env::temp_dir().join(format!("shroud-config-test-{}.toml", std::process::id()));
        fs::write(&path, "[builder]\nmin_actions = 2\n").unwrap();

        let config = ShroudConfig::load_from(&path).unwrap();
        fs::remove_file(&path).ok();

        if env::var("SHROUD_MIN_ACTIONS").is_err() {
            assert_eq!(config.builder.min_actions, 2);
        }
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = ShroudConfig::load_from(Path::new("/nonexistent/shroud.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
