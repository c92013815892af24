//! Error types for storefront sync operations.
//!
//! This module defines a comprehensive error enumeration using `thiserror`
//! to provide clear, actionable error reporting throughout the crate.

use thiserror::Error;

/// Custom error type for storefront sync operations.
///
/// Covers every failure mode in the sync layer: RPC communication, account
/// decoding, configuration, and internal task plumbing. The sync layer itself
/// has no fatal conditions — callers decide whether an error aborts anything
/// beyond its own branch of work.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Errors interacting with the Solana RPC.
    ///
    /// This covers network failures, timeout errors, or unexpected responses
    /// from the Solana RPC endpoint.
    #[error("RPC error: {0}")]
    RpcError(String),

    /// Errors from the Solana RPC client.
    #[error("RPC client error: {0}")]
    RpcClientError(Box<solana_client::client_error::ClientError>),

    /// Errors during account data decoding.
    ///
    /// Malformed, truncated, or tag-mismatched account bytes fail only that
    /// one account's decode; a sync pass continues over the rest.
    #[error("Decoding error: {0}")]
    DecodeError(String),

    /// Errors related to configuration.
    ///
    /// This includes missing required fields or invalid configuration values.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Errors during Solana public key parsing.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(#[from] solana_sdk::pubkey::ParsePubkeyError),

    /// Connection error (e.g. WebSocket subscription failure).
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Generic errors for operations that don't fit other categories.
    ///
    /// This provides a catch-all for unexpected errors while still maintaining
    /// error context.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Type alias for Results using `SyncError`.
pub type Result<T> = std::result::Result<T, SyncError>;

impl From<solana_client::client_error::ClientError> for SyncError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        SyncError::RpcClientError(Box::new(err))
    }
}
