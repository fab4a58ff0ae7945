//! Configuration for the `kgt` binary.
//!
//! The library never reads files or the environment; this module builds an
//! [`EngineConfig`] for the command-line harness from an optional YAML file
//! and `KGT_*` environment variables.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

use crate::graph::EngineConfig;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "kgt.yaml";

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub engine: EngineConfig,
    pub output: OutputYamlConfig,
}

/// Output configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputYamlConfig {
    /// Pretty-print JSON results
    pub pretty: bool,
}

impl Default for OutputYamlConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

// ============================================================================
// Runtime config
// ============================================================================

/// Resolved configuration used by the binary.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub engine: EngineConfig,
    pub pretty: bool,
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries [`DEFAULT_CONFIG_PATH`] in CWD. A missing
    /// or unparsable file falls back to the defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);
        Ok(Self::with_overrides(yaml, |key| std::env::var(key).ok()))
    }

    /// Apply `KGT_*` overrides from `lookup` on top of a parsed YAML config.
    ///
    /// Values that fail to parse are ignored.
    pub fn with_overrides(yaml: YamlConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut engine = yaml.engine;
        if let Some(v) = lookup("KGT_PAGERANK_DAMPING").and_then(|s| s.parse().ok()) {
            engine.pagerank_damping = v;
        }
        if let Some(v) = lookup("KGT_MAX_ITERATIONS").and_then(|s| s.parse().ok()) {
            engine.max_iterations = v;
            engine.jacobi_max_sweeps = v;
        }
        if let Some(v) = lookup("KGT_PRUNE_THRESHOLD").and_then(|s| s.parse().ok()) {
            engine.prune_threshold = v;
        }
        if let Some(v) = lookup("KGT_MERGE_THRESHOLD").and_then(|s| s.parse().ok()) {
            engine.merge_threshold = v;
        }
        let pretty = lookup("KGT_PRETTY")
            .and_then(|s| s.parse().ok())
            .unwrap_or(yaml.output.pretty);

        Self { engine, pretty }
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
