//! Config loading helpers (env + file + overrides).
//!
//! The loader owns the merge order and surfaces user-facing failures as
//! typed `ErrorEnvelope`s.

use crate::env::{BinderEnv, apply_env_overrides};
use crate::schema::BinderConfig;
use formbind_shared::{ErrorCode, ErrorEnvelope};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Serialized form of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json` files (and files without an extension).
    Json,
    /// `.toml` files.
    Toml,
}

/// Load the binder config from sources using a deterministic precedence order.
///
/// Precedence (highest wins):
/// - env overrides (`BinderEnv`)
/// - overrides JSON (partial config)
/// - config JSON (file content)
/// - defaults (`BinderConfig::default()`)
pub fn load_binder_config_from_sources(
    config_json: Option<&str>,
    overrides_json: Option<&str>,
    env: &BinderEnv,
) -> Result<BinderConfig, ErrorEnvelope> {
    let mut config = match config_json {
        None => BinderConfig::default(),
        Some(input) => parse_config_unvalidated(input, ConfigFormat::Json)?,
    };

    if let Some(input) = overrides_json {
        parse_overrides_json(input)?.apply(&mut config);
    }

    // env is applied last and also validates the resulting config.
    apply_env_overrides(config, env)
}

/// Load the binder config from an optional file path.
pub fn load_binder_config_from_path(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    env: &BinderEnv,
) -> Result<BinderConfig, ErrorEnvelope> {
    let mut config = match config_path {
        None => BinderConfig::default(),
        Some(path) => {
            let format = detect_config_format(path)?;
            let config_text = read_config_file(path)?;
            debug!(
                target: "formbind::config",
                path = %path.display(),
                format = ?format,
                "loading config file"
            );
            parse_config_unvalidated(&config_text, format)?
        },
    };

    if let Some(input) = overrides_json {
        parse_overrides_json(input)?.apply(&mut config);
    }

    apply_env_overrides(config, env)
}

/// Load the binder config from std env and an optional file path.
pub fn load_binder_config_std_env(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<BinderConfig, ErrorEnvelope> {
    let env = BinderEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_binder_config_from_path(config_path, overrides_json, &env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &BinderConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &BinderConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Pick the document format from the file extension.
pub fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

/// Read a config file, mapping I/O failures to `config:*` codes.
pub fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<BinderConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn parse_overrides_json(input: &str) -> Result<BinderConfigOverrides, ErrorEnvelope> {
    serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid overrides JSON: {error}"),
        )
        .with_metadata("source", "overrides")
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct BinderConfigOverrides {
    version: Option<u32>,
    max_multipart_memory: Option<u64>,
}

impl BinderConfigOverrides {
    const fn apply(self, config: &mut BinderConfig) {
        if let Some(version) = self.version {
            config.version = version;
        }
        if let Some(value) = self.max_multipart_memory {
            config.max_multipart_memory = value;
        }
    }
}
