//! Configuration system: JSON file + env var overrides + smart defaults.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{CadraError, Result};

/// Full CADRA configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub neo4j: Neo4jConfig,
    /// Directory containing attribute-assessment rule JSON files.
    pub attributes_rules_dir_path: PathBuf,
    /// Directory containing permission-assessment rule JSON files.
    pub permissions_rules_dir_path: PathBuf,
    /// `EventType` id → whether that event type is actively monitored.
    ///
    /// Drives the predisposing-condition negation in permission assessment:
    /// a rule's predisposing condition is negated once iff any of its
    /// `Events` appears here with `true`.
    pub event_monitoring: HashMap<u32, bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            neo4j: Neo4jConfig::default(),
            attributes_rules_dir_path: PathBuf::from("rules/attributes"),
            permissions_rules_dir_path: PathBuf::from("rules/permissions"),
            event_monitoring: HashMap::new(),
        }
    }
}

/// Neo4j connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from("config.json")
    }

    /// Load config from an explicit path, the `CADRA_CONFIG` env var, or the
    /// default path, then apply env overrides.
    ///
    /// A missing file is only an error when the path was explicit (via the
    /// `--config` flag or `CADRA_CONFIG`); the implicit default silently
    /// falls back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_config = if path.is_none() {
            env::var_os("CADRA_CONFIG").map(PathBuf::from)
        } else {
            None
        };

        let is_explicit_path = path.is_some() || env_config.is_some();
        let effective_path = path.map_or_else(
            || env_config.clone().unwrap_or_else(Self::default_path),
            Path::to_path_buf,
        );

        let mut cfg = if effective_path.exists() {
            let raw = fs::read_to_string(&effective_path)
                .map_err(|source| CadraError::io(effective_path.clone(), source))?;
            serde_json::from_str::<Self>(&raw)?
        } else if is_explicit_path {
            return Err(CadraError::MissingConfig {
                path: effective_path,
            });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate(&effective_path, is_explicit_path)?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(raw) = env_var("CADRA_NEO4J_URI") {
            self.neo4j.uri = raw;
        }
        if let Some(raw) = env_var("CADRA_NEO4J_USER") {
            self.neo4j.user = raw;
        }
        if let Some(raw) = env_var("CADRA_NEO4J_PASSWORD") {
            self.neo4j.password = raw;
        }
        if let Some(raw) = env_var("CADRA_ATTRIBUTES_RULES_DIR") {
            self.attributes_rules_dir_path = PathBuf::from(raw);
        }
        if let Some(raw) = env_var("CADRA_PERMISSIONS_RULES_DIR") {
            self.permissions_rules_dir_path = PathBuf::from(raw);
        }
        Ok(())
    }

    /// Validate the loaded config and confirm the rule directories exist.
    ///
    /// Only validates directory existence when the config file itself was
    /// resolved (explicit path, or a default path that actually exists) —
    /// a caller relying on pure built-in defaults with no config file at all
    /// is expected to pass `--config` before running a real assessment.
    fn validate(&self, config_path: &Path, is_explicit_path: bool) -> Result<()> {
        if self.neo4j.uri.trim().is_empty() {
            return Err(CadraError::InvalidConfig {
                details: "neo4j.uri must not be empty".to_string(),
            });
        }
        if !(self.neo4j.uri.starts_with("bolt://") || self.neo4j.uri.starts_with("neo4j://")) {
            return Err(CadraError::InvalidConfig {
                details: format!(
                    "neo4j.uri must start with \"bolt://\" or \"neo4j://\", got {:?}",
                    self.neo4j.uri
                ),
            });
        }

        let should_check_dirs = is_explicit_path || config_path.exists();
        if should_check_dirs {
            for dir in [
                &self.attributes_rules_dir_path,
                &self.permissions_rules_dir_path,
            ] {
                if !dir.is_dir() {
                    return Err(CadraError::MissingRulesDirectory { path: dir.clone() });
                }
            }
        }

        Ok(())
    }

    /// Whether the given `event_type` id is configured as actively monitored.
    #[must_use]
    pub fn is_monitored(&self, event_type: u32) -> bool {
        self.event_monitoring.get(&event_type).copied().unwrap_or(false)
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}
