//! Configuration management for the storefront sync layer.
//!
//! This module provides a flexible configuration system using the builder
//! pattern, allowing callers to configure the sync layer with type safety and
//! discoverability.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

use crate::utils::error::{Result, SyncError};

/// Tuning knobs for the bounded-concurrency pipeline executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of workers in flight at once.
    pub jobs_count: usize,
    /// Number of items dispatched per tick.
    pub sequence: usize,
    /// Delay between dispatch ticks, in milliseconds.
    pub delay_ms: u64,
}

impl PipelineConfig {
    /// Delay between dispatch ticks as a [`Duration`].
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            jobs_count: 8,
            sequence: 10,
            delay_ms: 100,
        }
    }
}

/// Configuration for the storefront sync layer.
///
/// Use [`SyncConfigBuilder`] to construct instances of this struct.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Solana RPC endpoint URL.
    pub rpc_url: String,

    /// WebSocket endpoint URL, required only for push subscriptions
    /// (the generic cache's native-balance path).
    pub ws_url: Option<String>,

    /// The storefront's store account address.
    pub store: Pubkey,

    /// Commitment level applied to every RPC read.
    pub commitment: CommitmentConfig,

    /// Pipeline executor tuning.
    pub pipeline: PipelineConfig,

    /// Capacity of the state service's command channel. Backpressure: sends
    /// suspend when the channel is full.
    pub state_channel_capacity: usize,
}

/// Builder for [`SyncConfig`].
///
/// All required fields must be set before calling `build()`.
///
/// # Example
///
/// ```no_run
/// use storefront_sync::SyncConfigBuilder;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SyncConfigBuilder::new()
///     .with_rpc("http://127.0.0.1:8899")
///     .store("11111111111111111111111111111111")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SyncConfigBuilder {
    rpc_url: Option<String>,
    ws_url: Option<String>,
    store: Option<String>,
    commitment: Option<CommitmentConfig>,
    pipeline: Option<PipelineConfig>,
    state_channel_capacity: Option<usize>,
}

impl SyncConfigBuilder {
    /// Creates a new configuration builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the Solana RPC endpoint URL.
    #[must_use]
    pub fn with_rpc(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Sets the WebSocket endpoint URL for push subscriptions.
    #[must_use]
    pub fn with_ws(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    /// Sets the store account address (parsed into a `Pubkey` at build time).
    #[must_use]
    pub fn store(mut self, address: impl Into<String>) -> Self {
        self.store = Some(address.into());
        self
    }

    /// Sets the commitment level (default: confirmed).
    #[must_use]
    pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = Some(commitment);
        self
    }

    /// Sets the pipeline executor tuning.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Sets the state service command-channel capacity (default: 256).
    #[must_use]
    pub fn with_state_channel_capacity(mut self, capacity: usize) -> Self {
        self.state_channel_capacity = Some(capacity);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::ConfigError` if the RPC URL or store address is
    /// missing, or if the store address cannot be parsed into a `Pubkey`.
    pub fn build(self) -> Result<SyncConfig> {
        let rpc_url = self
            .rpc_url
            .ok_or_else(|| SyncError::ConfigError("RPC URL is required".to_string()))?;

        let store_str = self
            .store
            .ok_or_else(|| SyncError::ConfigError("Store address is required".to_string()))?;

        let store = Pubkey::from_str(&store_str).map_err(|e| {
            SyncError::ConfigError(format!("Invalid store address '{store_str}': {e}"))
        })?;

        let capacity = self.state_channel_capacity.unwrap_or(256);
        if capacity == 0 {
            return Err(SyncError::ConfigError(
                "State channel capacity must be non-zero".to_string(),
            ));
        }

        Ok(SyncConfig {
            rpc_url,
            ws_url: self.ws_url,
            store,
            commitment: self.commitment.unwrap_or_else(CommitmentConfig::confirmed),
            pipeline: self.pipeline.unwrap_or_default(),
            state_channel_capacity: capacity,
        })
    }
}
