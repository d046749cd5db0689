//! Process-wide multipart memory budget.
//!
//! Set once at start-up, read by every multipart parse. Reconfiguring while
//! requests are in flight is allowed but the new value only applies to
//! parses that start afterwards.

use crate::schema::{BinderConfig, DEFAULT_MAX_MULTIPART_MEMORY};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static MAX_MULTIPART_MEMORY: AtomicU64 = AtomicU64::new(DEFAULT_MAX_MULTIPART_MEMORY);

/// Make `config` the process-wide setting.
pub fn install(config: &BinderConfig) {
    set_max_memory(config.max_multipart_memory);
}

/// Set the in-memory budget for multipart bodies, in bytes.
pub fn set_max_memory(bytes: u64) {
    debug!(target: "formbind::config", max_multipart_memory = bytes, "installing multipart budget");
    MAX_MULTIPART_MEMORY.store(bytes, Ordering::Relaxed);
}

/// Current in-memory budget for multipart bodies, in bytes.
pub fn max_memory() -> u64 {
    MAX_MULTIPART_MEMORY.load(Ordering::Relaxed)
}
