//! Account fetching over the Solana RPC surface.
//!
//! The [`AccountFetcher`] performs raw filtered and batched account
//! retrieval. It applies no layout validation and no retries — a transport
//! error propagates to the caller of that one call and aborts only that
//! branch of a sync pass.

use std::sync::Arc;

use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

use crate::utils::error::Result;
use crate::utils::rpc::{AccountFilter, DefaultRpcProvider, RpcProvider};

/// Hard protocol ceiling on keys per `getMultipleAccounts` call.
pub const MAX_MULTIPLE_ACCOUNTS: usize = 100;

/// Account fetcher for filtered program scans and batched account reads.
///
/// # Example
///
/// ```no_run
/// # use storefront_sync::AccountFetcher;
/// # use solana_sdk::commitment_config::CommitmentConfig;
/// let fetcher = AccountFetcher::new("http://127.0.0.1:8899", CommitmentConfig::confirmed());
/// ```
pub struct AccountFetcher {
    /// Underlying provider (a mock in tests).
    rpc: Arc<dyn RpcProvider>,
    commitment: CommitmentConfig,
}

impl AccountFetcher {
    /// Creates a new fetcher backed by a [`DefaultRpcProvider`] over `rpc_url`.
    #[must_use]
    pub fn new(rpc_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        let url = rpc_url.into();
        let provider = DefaultRpcProvider::new_with_commitment(&url, commitment);
        Self {
            rpc: Arc::new(provider),
            commitment,
        }
    }

    /// Creates a fetcher backed by a custom [`RpcProvider`].
    ///
    /// Use this to inject a mock provider for testing.
    #[must_use]
    pub fn with_provider(rpc: Arc<dyn RpcProvider>, commitment: CommitmentConfig) -> Self {
        Self { rpc, commitment }
    }

    /// The commitment level applied to every read.
    #[must_use]
    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }

    /// Fetches all accounts owned by `program_id` matching `filters`.
    ///
    /// Filters are passed through unchecked: an incorrect memcmp offset
    /// silently returns wrong or empty results.
    pub async fn fetch_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[AccountFilter],
    ) -> Result<Vec<(Pubkey, Account)>> {
        self.rpc
            .get_program_accounts(program_id, filters, Some(self.commitment))
            .await
    }

    /// Fetches multiple accounts by address, preserving input order.
    ///
    /// The address list is chunked at [`MAX_MULTIPLE_ACCOUNTS`] keys per
    /// underlying call; results are concatenated so the output is aligned to
    /// the input regardless of how many chunks were issued. Missing accounts
    /// are `None`, not errors.
    pub async fn fetch_multiple_accounts(
        &self,
        pubkeys: &[Pubkey],
    ) -> Result<Vec<Option<Account>>> {
        let mut results = Vec::with_capacity(pubkeys.len());
        for chunk in pubkeys.chunks(MAX_MULTIPLE_ACCOUNTS) {
            let mut batch = self
                .rpc
                .get_multiple_accounts(chunk, Some(self.commitment))
                .await?;
            results.append(&mut batch);
        }
        Ok(results)
    }

    /// Fetches a single account; `None` means it does not exist.
    pub async fn fetch_account(&self, pubkey: &Pubkey) -> Result<Option<Account>> {
        self.rpc
            .get_account_info(pubkey, Some(self.commitment))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Mock provider that synthesizes accounts whose first data byte encodes
    /// the request position, and counts underlying calls.
    struct ChunkCountingProvider {
        calls: AtomicU32,
    }

    #[async_trait]
    impl RpcProvider for ChunkCountingProvider {
        async fn get_program_accounts(
            &self,
            _: &Pubkey,
            _: &[AccountFilter],
            _: Option<CommitmentConfig>,
        ) -> Result<Vec<(Pubkey, Account)>> {
            Ok(vec![])
        }

        async fn get_multiple_accounts(
            &self,
            pubkeys: &[Pubkey],
            _: Option<CommitmentConfig>,
        ) -> Result<Vec<Option<Account>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(pubkeys.len() <= MAX_MULTIPLE_ACCOUNTS);
            Ok(pubkeys
                .iter()
                .map(|pk| {
                    Some(Account {
                        lamports: 1,
                        data: pk.to_bytes().to_vec(),
                        owner: Pubkey::default(),
                        executable: false,
                        rent_epoch: 0,
                    })
                })
                .collect())
        }

        async fn get_account_info(
            &self,
            _: &Pubkey,
            _: Option<CommitmentConfig>,
        ) -> Result<Option<Account>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_fetch_multiple_chunks_and_preserves_order() {
        let provider = Arc::new(ChunkCountingProvider {
            calls: AtomicU32::new(0),
        });
        let fetcher =
            AccountFetcher::with_provider(provider.clone(), CommitmentConfig::confirmed());

        let keys: Vec<Pubkey> = (0..250).map(|_| Pubkey::new_unique()).collect();
        let accounts = fetcher.fetch_multiple_accounts(&keys).await.unwrap();

        assert_eq!(accounts.len(), keys.len());
        // 250 keys at a 100-key ceiling → 3 underlying calls
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        for (key, account) in keys.iter().zip(accounts.iter()) {
            assert_eq!(account.as_ref().unwrap().data, key.to_bytes().to_vec());
        }
    }

    #[tokio::test]
    async fn test_fetch_multiple_empty_input() {
        let provider = Arc::new(ChunkCountingProvider {
            calls: AtomicU32::new(0),
        });
        let fetcher =
            AccountFetcher::with_provider(provider.clone(), CommitmentConfig::confirmed());

        let accounts = fetcher.fetch_multiple_accounts(&[]).await.unwrap();
        assert!(accounts.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
