//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict: a variable that is present but empty, non-numeric,
//! or zero fails instead of being ignored.

use crate::schema::BinderConfig;
use formbind_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: in-memory budget for multipart bodies, in bytes.
pub const ENV_MAX_MULTIPART_MEMORY: &str = "FORMBIND_MAX_MULTIPART_MEMORY";

/// Parsed env overrides. `None` means the variable was not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinderEnv {
    /// Override for `maxMultipartMemory`.
    pub max_multipart_memory: Option<u64>,
}

impl BinderEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            max_multipart_memory: parse_optional_nonzero_u64(map, ENV_MAX_MULTIPART_MEMORY)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in [ENV_MAX_MULTIPART_MEMORY] {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }
        Self::from_map(&map)
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: BinderConfig,
    env: &BinderEnv,
) -> Result<BinderConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(value) = env.max_multipart_memory {
        config.max_multipart_memory = value;
    }
    config.validate().map_err(Into::into)
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Integer env var was zero where a positive value is required.
    ZeroValue {
        /// Env var name.
        var: &'static str,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::ZeroValue { .. } => ErrorCode::new("config", "zero_env_int"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
            Self::ZeroValue { var } => write!(formatter, "{var} must be greater than zero"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } | EnvParseError::ZeroValue { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::InvalidInt { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", value),
        }
    }
}

fn parse_optional_nonzero_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    match trimmed.parse::<u64>() {
        Ok(0) => Err(EnvParseError::ZeroValue { var }),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        }),
    }
}
