//! Engine configuration with environment overrides.

use std::collections::HashMap;

use crate::error::{BatchError, Result};

/// Chunk size used by step builders when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Tunable engine defaults; hosts load one of these and feed it to the
/// policy and builder constructors.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub default_chunk_size: usize,
    /// Total attempts per chunk for config-derived retry policies.
    pub retry_limit: u32,
    pub retry_delay_ms: u64,
    pub backoff_max_ms: u64,
    /// Skip budget per execution for config-derived skip policies.
    pub skip_limit: u32,
    pub custom_settings: HashMap<String, String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            default_chunk_size: DEFAULT_CHUNK_SIZE,
            retry_limit: 3,
            retry_delay_ms: 1000,
            backoff_max_ms: 60000,
            skip_limit: 0,
            custom_settings: HashMap::new(),
        }
    }
}

impl BatchConfig {
    /// Defaults overridden by `BATCH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(chunk_size) = std::env::var("BATCH_DEFAULT_CHUNK_SIZE") {
            config.default_chunk_size = chunk_size.parse().map_err(|e| {
                BatchError::Configuration(format!("invalid default_chunk_size: {e}"))
            })?;
        }
        if let Ok(retry_limit) = std::env::var("BATCH_RETRY_LIMIT") {
            config.retry_limit = retry_limit
                .parse()
                .map_err(|e| BatchError::Configuration(format!("invalid retry_limit: {e}")))?;
        }
        if let Ok(delay) = std::env::var("BATCH_RETRY_DELAY_MS") {
            config.retry_delay_ms = delay
                .parse()
                .map_err(|e| BatchError::Configuration(format!("invalid retry_delay_ms: {e}")))?;
        }
        if let Ok(backoff) = std::env::var("BATCH_BACKOFF_MAX_MS") {
            config.backoff_max_ms = backoff
                .parse()
                .map_err(|e| BatchError::Configuration(format!("invalid backoff_max_ms: {e}")))?;
        }
        if let Ok(skip_limit) = std::env::var("BATCH_SKIP_LIMIT") {
            config.skip_limit = skip_limit
                .parse()
                .map_err(|e| BatchError::Configuration(format!("invalid skip_limit: {e}")))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fail_fast() {
        let config = BatchConfig::default();
        assert_eq!(config.default_chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.skip_limit, 0);
        assert_eq!(config.retry_limit, 3);
    }
}
