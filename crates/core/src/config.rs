//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the registry. Core
//! operations never read environment variables themselves; the binary reads them and hands the
//! raw values to the parsing helpers below.

use crate::error::{ConfigError, ConfigResult};
use hmc_ids::IdStrategy;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    data_dir: Option<PathBuf>,
    id_strategy: IdStrategy,
    seed_fixtures: bool,
}

impl Default for CoreConfig {
    /// In-memory collections, UUID identifiers, seeded with fixtures.
    fn default() -> Self {
        Self {
            data_dir: None,
            id_strategy: IdStrategy::default(),
            seed_fixtures: true,
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `data_dir` enables YAML file persistence under that directory; `None` keeps every
    /// collection in memory for the lifetime of the process.
    ///
    /// The counter strategy restarts at 1 in every process, so it is only accepted for in-memory
    /// collections: persisted identifiers must never be handed out twice.
    pub fn new(
        data_dir: Option<PathBuf>,
        id_strategy: IdStrategy,
        seed_fixtures: bool,
    ) -> ConfigResult<Self> {
        if let Some(dir) = &data_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::InvalidInput(
                    "data_dir cannot be empty".into(),
                ));
            }
            if dir.exists() && !dir.is_dir() {
                return Err(ConfigError::InvalidInput(format!(
                    "data_dir {} exists but is not a directory",
                    dir.display()
                )));
            }
            if id_strategy == IdStrategy::Counter {
                return Err(ConfigError::InvalidInput(format!(
                    "id strategy '{id_strategy}' restarts on every run and cannot be used with data_dir {}",
                    dir.display()
                )));
            }
        }

        Ok(Self {
            data_dir,
            id_strategy,
            seed_fixtures,
        })
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn id_strategy(&self) -> IdStrategy {
        self.id_strategy
    }

    pub fn seed_fixtures(&self) -> bool {
        self.seed_fixtures
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the identifier strategy from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default (`uuid`).
pub fn id_strategy_from_env_value(value: Option<String>) -> ConfigResult<IdStrategy> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<IdStrategy>())
        .transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Parse a boolean flag from an optional string value.
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off` in any case. `None` or empty/whitespace
/// returns `default`.
pub fn bool_from_env_value(value: Option<String>, default: bool) -> ConfigResult<bool> {
    let Some(value) = non_blank(value) else {
        return Ok(default);
    };

    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidInput(format!(
            "expected a boolean (true/false, 1/0, yes/no, on/off), got '{value}'"
        ))),
    }
}

/// Parse the data directory from an optional string value. Blank means in-memory only.
pub fn data_dir_from_env_value(value: Option<String>) -> Option<PathBuf> {
    non_blank(value).map(PathBuf::from)
}
