//! Store-indexer page discovery.
//!
//! Pages are program-derived accounts chained by sequential page number; the
//! pager walks them from zero, merging each page and fanning out over the
//! auction caches it references.

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;

use crate::core::fetcher::AccountFetcher;
use crate::core::registry::{decode_account, DecodedAccount};
use crate::core::service::StateHandle;
use crate::types::{AccountRecord, AuctionCache, StoreIndexer};
use crate::utils::error::Result;
use crate::utils::pda;

/// Walks a store's indexer pages and loads everything they reference.
pub struct StoreIndexPager {
    fetcher: Arc<AccountFetcher>,
    state: StateHandle,
    store: Pubkey,
}

impl StoreIndexPager {
    #[must_use]
    pub fn new(fetcher: Arc<AccountFetcher>, state: StateHandle, store: Pubkey) -> Self {
        Self {
            fetcher,
            state,
            store,
        }
    }

    /// Deterministic page address derivation; no I/O.
    #[must_use]
    pub fn page_address(&self, page: u64) -> Pubkey {
        pda::indexer_page_address(&self.store, page)
    }

    /// Pulls pages starting at 0, stopping at the first missing page, and
    /// returns the ordered list collected so far.
    ///
    /// Termination assumes contiguous pages from zero: a gap (e.g. a failed
    /// on-chain page write) silently truncates all later pages. Whether that
    /// on-chain behaviour is intentional is unresolved; this walker
    /// deliberately mirrors it rather than probing past gaps.
    pub async fn pull_pages(&self) -> Result<Vec<AccountRecord<StoreIndexer>>> {
        let mut pages = Vec::new();
        let mut page = 0u64;
        loop {
            match self.pull_page(page).await? {
                Some(record) => {
                    pages.push(record);
                    page += 1;
                }
                None => break,
            }
        }
        tracing::debug!(store = %self.store, pages = pages.len(), "store index walk complete");
        Ok(pages)
    }

    /// Pulls a single page and everything it references.
    ///
    /// Returns `Ok(None)` when the page account does not exist. For every
    /// auction-cache address on the page, fans out batched fetches for the
    /// cache itself and then its auction, vault, auction-manager and metadata
    /// accounts, feeding each decoded record into the state.
    pub async fn pull_page(&self, page: u64) -> Result<Option<AccountRecord<StoreIndexer>>> {
        let address = self.page_address(page);
        let Some(account) = self.fetcher.fetch_account(&address).await? else {
            return Ok(None);
        };

        let indexer = StoreIndexer::decode(&account.data)?;
        let record = AccountRecord::new(address, account.clone(), indexer.clone());
        self.state
            .merge(address, account, DecodedAccount::StoreIndexer(indexer.clone()))
            .await?;

        // The fetcher batches at the 100-key protocol ceiling internally.
        let cache_accounts = self
            .fetcher
            .fetch_multiple_accounts(&indexer.auction_caches)
            .await?;
        for (cache_address, cache_account) in
            indexer.auction_caches.iter().zip(cache_accounts)
        {
            let Some(cache_account) = cache_account else {
                continue;
            };
            let cache = match AuctionCache::decode(&cache_account.data) {
                Ok(cache) => cache,
                Err(e) => {
                    tracing::debug!(address = %cache_address, error = %e, "skipping undecodable auction cache");
                    continue;
                }
            };
            self.state
                .merge(
                    *cache_address,
                    cache_account,
                    DecodedAccount::AuctionCache(cache.clone()),
                )
                .await?;
            self.load_cache_references(&cache).await?;
        }

        Ok(Some(record))
    }

    /// Loads the auction, vault, auction-manager and metadata accounts one
    /// auction cache references.
    async fn load_cache_references(&self, cache: &AuctionCache) -> Result<()> {
        let mut keys = vec![cache.auction, cache.vault, cache.auction_manager];
        keys.extend_from_slice(&cache.metadata);

        let accounts = self.fetcher.fetch_multiple_accounts(&keys).await?;

        let mut entries = Vec::new();
        let mut metadata_records = Vec::new();
        for (key, account) in keys.iter().zip(accounts) {
            let Some(account) = account else {
                continue;
            };
            match decode_account(&account.owner, &account.data) {
                Ok(decoded) => {
                    if let DecodedAccount::Metadata(meta) = &decoded {
                        metadata_records
                            .push(AccountRecord::new(*key, account.clone(), meta.clone()));
                    }
                    entries.push((*key, account, decoded));
                }
                Err(e) => {
                    tracing::debug!(address = %key, error = %e, "skipping undecodable cache reference");
                }
            }
        }

        self.state.merge_batch(entries).await?;
        self.state
            .set_auction_metadata(cache.auction, metadata_records)
            .await?;
        Ok(())
    }
}
