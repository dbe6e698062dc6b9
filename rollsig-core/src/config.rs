//! Job configuration: file loading and validation.
//!
//! The config file is decoded (YAML, or TOML for `.toml` paths) into a
//! neutral `serde_json::Value` and then checked by [`validate`], which only
//! ever sees a key→value mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{format_list, ConfigError, JobError};
use crate::run_log::RunLog;

/// Keys every config file must provide.
pub const REQUIRED_KEYS: [&str; 3] = ["seed", "window", "version"];

/// Validated job settings. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub seed: u64,
    pub window: usize,
    pub version: String,
}

/// Input format of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Toml => "TOML",
        }
    }
}

/// Read, decode and validate the config file at `path`.
pub fn load_config(path: &Path, log: &mut RunLog) -> Result<JobConfig, JobError> {
    log.info(format!("Loading configuration from '{}'", path.display()));

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into())
        }
        Err(e) => return Err(JobError::unexpected(e)),
    };

    let raw = parse_config(&text, ConfigFormat::from_path(path), path)?;
    let config = validate(&raw)?;

    let extra: Vec<&String> = raw
        .keys()
        .filter(|k| !REQUIRED_KEYS.contains(&k.as_str()))
        .collect();
    if !extra.is_empty() {
        log.debug(format!("Ignoring extra config keys: {}", format_list(&extra)));
    }

    log.info(format!(
        "Config loaded: version={} | seed={} | window={}",
        config.version, config.seed, config.window
    ));
    log.debug(format!("Full config: {}", Value::Object(raw)));
    Ok(config)
}

/// Decode config text into a key→value mapping.
pub fn parse_config(
    text: &str,
    format: ConfigFormat,
    path: &Path,
) -> Result<Map<String, Value>, ConfigError> {
    if text.trim().is_empty() {
        return Err(ConfigError::EmptyFile {
            path: path.to_path_buf(),
        });
    }

    let parse_err = |reason: String| ConfigError::Parse {
        format: format.label(),
        reason,
    };
    let value: Value = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string()))?,
        ConfigFormat::Toml => toml::from_str(text).map_err(|e| parse_err(e.to_string()))?,
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAMapping),
    }
}

/// Check the raw mapping and build a [`JobConfig`].
pub fn validate(raw: &Map<String, Value>) -> Result<JobConfig, ConfigError> {
    let mut missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|k| !raw.contains_key(**k))
        .map(|k| k.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(ConfigError::MissingKeys { keys: missing });
    }

    let seed = &raw["seed"];
    let seed = seed.as_u64().ok_or_else(|| ConfigError::TypeMismatch {
        key: "seed",
        expected: "a non-negative integer",
        found: describe(seed),
    })?;

    let window = &raw["window"];
    let window = window
        .as_u64()
        .filter(|w| *w >= 1)
        .and_then(|w| usize::try_from(w).ok())
        .ok_or_else(|| ConfigError::TypeMismatch {
            key: "window",
            expected: "a positive integer",
            found: describe(window),
        })?;

    let version = &raw["version"];
    let version = version
        .as_str()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::TypeMismatch {
            key: "version",
            expected: "a non-empty string",
            found: describe(version),
        })?
        .to_string();

    Ok(JobConfig {
        seed,
        window,
        version,
    })
}

/// Short type-and-value description used in mismatch messages.
fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) if n.is_f64() => format!("float {n}"),
        Value::Number(n) => format!("integer {n}"),
        Value::String(s) => format!("string '{s}'"),
        Value::Array(_) => "list".to_string(),
        Value::Object(_) => "mapping".to_string(),
    }
}
