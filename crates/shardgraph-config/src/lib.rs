// shardgraph-config/src/lib.rs
// ============================================================================
// Module: Shardgraph Config Library
// Description: Deserializable, validated configuration for the evaluator.
// Purpose: Let the CLI (and any other embedder) load memory limit, hash
//          algorithm, evaluation algorithm choice, and store location from a
//          single TOML file with a fail-closed validation pass.
// Dependencies: shardgraph-core, serde, toml
// ============================================================================

//! ## Overview
//! [`ShardgraphConfig::load`] reads a TOML file, enforcing a hard size
//! limit, and validates it with [`ShardgraphConfig::validate`]. Validation
//! fails closed: an algorithm choice of [`AlgorithmChoice::Complex`] with a
//! zero memory limit, or a `store_dir` that cannot be resolved, is rejected
//! rather than silently tolerated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use shardgraph_core::hashing::HashAlgorithm;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "shardgraph.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SHARDGRAPH_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length accepted for `store_dir`.
pub const MAX_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: AlgorithmChoice
// ============================================================================

/// Which [`shardgraph_core::EvaluationAlgorithm`] the evaluator should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmChoice {
    /// Plain depth-first evaluation with no spilling.
    #[default]
    Topological,
    /// Memory-budget-aware evaluation that spills cold results to disk.
    Complex,
}

// ============================================================================
// SECTION: ShardgraphConfig
// ============================================================================

/// Top-level configuration for a `shardgraph` evaluation run.
#[derive(Debug, Clone, Deserialize)]
pub struct ShardgraphConfig {
    /// Soft memory budget, in bytes, enforced by [`AlgorithmChoice::Complex`].
    #[serde(default = "default_memory_limit_bytes")]
    pub memory_limit_bytes: u64,
    /// Content-hash algorithm used to address activations and store entries.
    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: HashAlgorithm,
    /// Which evaluation algorithm to drive the graph with.
    #[serde(default)]
    pub algorithm: AlgorithmChoice,
    /// Directory the file-backed store is rooted at.
    pub store_dir: PathBuf,
}

impl ShardgraphConfig {
    /// Loads configuration from disk, resolving the path from `path`, the
    /// [`CONFIG_ENV_VAR`] environment variable, or [`DEFAULT_CONFIG_NAME`],
    /// in that order, then validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, exceeds
    /// [`MAX_CONFIG_FILE_SIZE`], is not valid UTF-8 TOML, or fails
    /// validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path_length(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_owned()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_owned()))?;
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `algorithm` is
    /// [`AlgorithmChoice::Complex`] and `memory_limit_bytes` is zero, or if
    /// `store_dir` is empty or exceeds [`MAX_PATH_LENGTH`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.algorithm == AlgorithmChoice::Complex && self.memory_limit_bytes == 0 {
            return Err(ConfigError::Invalid(
                "algorithm=complex requires memory_limit_bytes > 0".to_owned(),
            ));
        }
        validate_path_length(&self.store_dir)?;
        if self.store_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store_dir must be set".to_owned()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default soft memory budget: 256 MiB.
const fn default_memory_limit_bytes() -> u64 {
    256 * 1024 * 1024
}

/// Default content-hash algorithm: SHA-256.
const fn default_hash_algorithm() -> HashAlgorithm {
    HashAlgorithm::Sha256
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating a [`ShardgraphConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading the configuration file.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Configuration data failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Path Helpers
// ============================================================================

/// Resolves the config path from an explicit argument, the
/// [`CONFIG_ENV_VAR`] environment variable, or [`DEFAULT_CONFIG_NAME`].
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        return validate_path_length(Path::new(&env_path)).map(|()| PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Rejects a path whose textual length exceeds [`MAX_PATH_LENGTH`].
fn validate_path_length(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_PATH_LENGTH {
        return Err(ConfigError::Invalid("path exceeds max length".to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only assertions favor clarity over production error handling."
    )]

    use super::*;
    use std::io::Write as _;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn loads_minimal_config_with_defaults() {
        let file = write_config("store_dir = \"/tmp/shardgraph-store\"\n");
        let config = ShardgraphConfig::load(Some(file.path())).expect("load");
        assert_eq!(config.algorithm, AlgorithmChoice::Topological);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
        assert!(config.memory_limit_bytes > 0);
    }

    #[test]
    fn complex_algorithm_requires_nonzero_memory_limit() {
        let file = write_config(
            "store_dir = \"/tmp/shardgraph-store\"\nalgorithm = \"complex\"\nmemory_limit_bytes = 0\n",
        );
        let err = ShardgraphConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_store_dir_fails_to_parse() {
        let file = write_config("memory_limit_bytes = 1024\n");
        let err = ShardgraphConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn nonexistent_path_errors() {
        let err = ShardgraphConfig::load(Some(Path::new("/nonexistent/shardgraph.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
