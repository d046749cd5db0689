//! # formbind-config
//!
//! Binder configuration: schema and defaults, JSON/TOML file loading, env
//! overrides, and the process-wide multipart memory budget.

/// Environment variable parsing and merging.
pub mod env;
/// Process-wide settings read at bind time.
pub mod global;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use env::{BinderEnv, ENV_MAX_MULTIPART_MEMORY, EnvParseError, apply_env_overrides};
pub use global::{install, max_memory, set_max_memory};
pub use load::{
    ConfigFormat, detect_config_format, load_binder_config_from_path,
    load_binder_config_from_sources, load_binder_config_std_env, read_config_file,
    to_pretty_json, to_pretty_toml,
};
pub use schema::{
    BinderConfig, CURRENT_CONFIG_VERSION, ConfigSchemaError, DEFAULT_MAX_MULTIPART_MEMORY,
    parse_binder_config_json, parse_binder_config_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
