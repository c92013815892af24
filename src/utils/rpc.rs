//! RPC provider abstraction over the Solana JSON-RPC surface this crate consumes.
//!
//! The [`RpcProvider`] trait covers exactly the calls the sync layer needs:
//! filtered program scans, batched multi-account reads, and single-account
//! lookups. [`DefaultRpcProvider`] implements it over the nonblocking
//! `solana_client` RPC client; tests inject mock implementations instead.

use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_sdk::{account::Account, commitment_config::CommitmentConfig, pubkey::Pubkey};

use crate::utils::error::Result;

/// A caller-supplied account filter for program scans.
///
/// The fetcher performs no layout validation on these: an incorrect offset
/// silently returns wrong or empty results, exactly as the RPC node would.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    /// Match accounts whose data equals `bytes` at `offset`.
    Memcmp { offset: usize, bytes: Vec<u8> },
    /// Match accounts whose data is exactly `size` bytes long.
    DataSize(u64),
}

impl AccountFilter {
    /// Convenience constructor for a memcmp filter.
    #[must_use]
    pub fn memcmp(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Memcmp {
            offset,
            bytes: bytes.into(),
        }
    }

    fn to_rpc_filter(&self) -> RpcFilterType {
        match self {
            AccountFilter::Memcmp { offset, bytes } => {
                RpcFilterType::Memcmp(Memcmp::new_raw_bytes(*offset, bytes.clone()))
            }
            AccountFilter::DataSize(size) => RpcFilterType::DataSize(*size),
        }
    }
}

/// The RPC surface consumed by the sync layer.
///
/// Implementations do not retry; a transport error propagates to the caller
/// of that one call.
#[async_trait]
pub trait RpcProvider: Send + Sync {
    /// `getProgramAccounts` with optional memcmp/dataSize filters.
    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
        commitment: Option<CommitmentConfig>,
    ) -> Result<Vec<(Pubkey, Account)>>;

    /// `getMultipleAccounts`; the result is aligned to the input order and
    /// missing accounts are `None`, not errors. Callers are responsible for
    /// the 100-key protocol ceiling (see `AccountFetcher`).
    async fn get_multiple_accounts(
        &self,
        pubkeys: &[Pubkey],
        commitment: Option<CommitmentConfig>,
    ) -> Result<Vec<Option<Account>>>;

    /// `getAccountInfo`; `None` means the account does not exist.
    async fn get_account_info(
        &self,
        pubkey: &Pubkey,
        commitment: Option<CommitmentConfig>,
    ) -> Result<Option<Account>>;
}

/// Default provider backed by the nonblocking `solana_client` RPC client.
pub struct DefaultRpcProvider {
    client: RpcClient,
}

impl DefaultRpcProvider {
    /// Creates a provider connecting to `rpc_url` with the default commitment level.
    #[must_use]
    pub fn new(rpc_url: &str) -> Self {
        Self {
            client: RpcClient::new(rpc_url.to_string()),
        }
    }

    /// Creates a provider with a specific commitment configuration.
    #[must_use]
    pub fn new_with_commitment(rpc_url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url.to_string(), commitment),
        }
    }
}

#[async_trait]
impl RpcProvider for DefaultRpcProvider {
    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
        commitment: Option<CommitmentConfig>,
    ) -> Result<Vec<(Pubkey, Account)>> {
        let rpc_filters: Vec<RpcFilterType> =
            filters.iter().map(AccountFilter::to_rpc_filter).collect();
        let config = RpcProgramAccountsConfig {
            filters: if rpc_filters.is_empty() {
                None
            } else {
                Some(rpc_filters)
            },
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment,
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        Ok(self
            .client
            .get_program_accounts_with_config(program_id, config)
            .await?)
    }

    async fn get_multiple_accounts(
        &self,
        pubkeys: &[Pubkey],
        commitment: Option<CommitmentConfig>,
    ) -> Result<Vec<Option<Account>>> {
        Ok(self
            .client
            .get_multiple_accounts_with_commitment(pubkeys, commitment.unwrap_or_default())
            .await?
            .value)
    }

    async fn get_account_info(
        &self,
        pubkey: &Pubkey,
        commitment: Option<CommitmentConfig>,
    ) -> Result<Option<Account>> {
        Ok(self
            .client
            .get_account_with_commitment(pubkey, commitment.unwrap_or_default())
            .await?
            .value)
    }
}
