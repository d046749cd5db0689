//! Binder configuration schema, defaults, and validation.
//!
//! Deserialization uses `serde`; validation is manual and returns typed
//! errors mapped to `ErrorEnvelope`.

use formbind_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Default in-memory budget for multipart bodies (16 MiB).
pub const DEFAULT_MAX_MULTIPART_MEMORY: u64 = 16 << 20;

const MAX_MULTIPART_MEMORY_MIN: u64 = 1;
const MAX_MULTIPART_MEMORY_MAX: u64 = 1 << 40;

/// Process-wide binder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BinderConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Bytes of uploaded file content kept in memory before spilling to disk.
    pub max_multipart_memory: u64,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            max_multipart_memory: DEFAULT_MAX_MULTIPART_MEMORY,
        }
    }
}

impl BinderConfig {
    /// Validate the config, returning it unchanged on success.
    pub const fn validate(self) -> Result<Self, ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        let value = self.max_multipart_memory;
        if value < MAX_MULTIPART_MEMORY_MIN || value > MAX_MULTIPART_MEMORY_MAX {
            return Err(ConfigSchemaError::LimitOutOfRange {
                field: "maxMultipartMemory",
                value,
                min: MAX_MULTIPART_MEMORY_MIN,
                max: MAX_MULTIPART_MEMORY_MAX,
            });
        }
        Ok(self)
    }
}

/// Parse a binder config from a JSON string, applying validation.
pub fn parse_binder_config_json(input: &str) -> Result<BinderConfig, ErrorEnvelope> {
    let config: BinderConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate().map_err(Into::into)
}

/// Parse a binder config from a TOML string, applying validation.
pub fn parse_binder_config_toml(input: &str) -> Result<BinderConfig, ErrorEnvelope> {
    let config: BinderConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate().map_err(Into::into)
}

/// Schema validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A numeric limit is out of bounds.
    LimitOutOfRange {
        /// Field name in the config file (e.g. `maxMultipartMemory`).
        field: &'static str,
        /// Value provided.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::LimitOutOfRange { .. } => ErrorCode::new("config", "limit_out_of_range"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => write!(
                formatter,
                "unsupported config version {found} (supported: {supported})"
            ),
            Self::LimitOutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                formatter,
                "{field} is out of range ({value}, allowed {min}..={max})"
            ),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::LimitOutOfRange {
                field,
                value,
                min,
                max,
            } => envelope
                .with_metadata("field", field)
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
        }
    }
}
