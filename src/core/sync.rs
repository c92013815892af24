//! Main sync orchestrator that integrates all components.
//!
//! A full pass runs in explicitly ordered phases. The ordering between the
//! creator phase and the metadata phases is a correctness requirement, not an
//! optimization: the whitelist gate can only be trusted once every creator
//! has been merged, so creators are fetched and awaited first and the gate is
//! re-evaluated after metadata discovery.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use solana_sdk::pubkey::Pubkey;

use crate::config::SyncConfig;
use crate::core::fetcher::{AccountFetcher, MAX_MULTIPLE_ACCOUNTS};
use crate::core::pager::StoreIndexPager;
use crate::core::pipeline::run_pipeline;
use crate::core::registry::{decode_account, AccountKind, DecodedAccount};
use crate::core::service::{StateHandle, StateService};
use crate::core::state::MarketState;
use crate::types::metadata::MAX_CREATOR_LIMIT;
use crate::types::{ids, AuctionKey, MarketplaceKey, Metadata, MetadataKey, VaultKey};
use crate::utils::error::Result;
use crate::utils::logging;
use crate::utils::rpc::{AccountFilter, RpcProvider};

/// The storefront synchronization layer.
///
/// Owns the fetcher and the state service; higher layers read through
/// [`StorefrontSync::snapshot`] and never mutate state directly.
///
/// # Example
///
/// ```no_run
/// use storefront_sync::{StorefrontSync, SyncConfigBuilder};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = SyncConfigBuilder::new()
///     .with_rpc("https://api.mainnet-beta.solana.com")
///     .store("11111111111111111111111111111111")
///     .build()?;
///
/// let sync = StorefrontSync::new(config);
/// sync.full_sync().await?;
/// let state = sync.snapshot().await?;
/// println!("{} auctions cached", state.auctions.len());
/// # Ok(())
/// # }
/// ```
pub struct StorefrontSync {
    config: SyncConfig,
    fetcher: Arc<AccountFetcher>,
    state: StateHandle,
    full_pass_in_flight: AtomicBool,
}

impl StorefrontSync {
    /// Creates a sync layer talking to the configured RPC endpoint.
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        let fetcher = Arc::new(AccountFetcher::new(&config.rpc_url, config.commitment));
        Self::with_parts(config, fetcher)
    }

    /// Creates a sync layer backed by a custom [`RpcProvider`].
    ///
    /// This is the mock-injection seam used by tests.
    #[must_use]
    pub fn with_provider(config: SyncConfig, rpc: Arc<dyn RpcProvider>) -> Self {
        let commitment = config.commitment;
        let fetcher = Arc::new(AccountFetcher::with_provider(rpc, commitment));
        Self::with_parts(config, fetcher)
    }

    fn with_parts(config: SyncConfig, fetcher: Arc<AccountFetcher>) -> Self {
        let state = StateService::spawn(config.state_channel_capacity);
        Self {
            config,
            fetcher,
            state,
            full_pass_in_flight: AtomicBool::new(false),
        }
    }

    /// A cloneable handle to the state service, for narrower passes.
    #[must_use]
    pub fn state(&self) -> StateHandle {
        self.state.clone()
    }

    /// The underlying account fetcher.
    #[must_use]
    pub fn fetcher(&self) -> Arc<AccountFetcher> {
        self.fetcher.clone()
    }

    /// An immutable snapshot of the aggregate state.
    pub async fn snapshot(&self) -> Result<Arc<MarketState>> {
        self.state.snapshot().await
    }

    /// A pager for this store's indexer pages. Page passes may run
    /// concurrently with a full pass.
    #[must_use]
    pub fn pager(&self) -> StoreIndexPager {
        StoreIndexPager::new(self.fetcher.clone(), self.state.clone(), self.config.store)
    }

    /// Runs one full synchronization pass.
    ///
    /// Overlapping full passes are skipped (an in-flight flag, not a queue);
    /// narrower passes are never guarded and may run concurrently. A pass
    /// runs to completion once started — there is no cancellation.
    pub async fn full_sync(&self) -> Result<()> {
        if self.full_pass_in_flight.swap(true, Ordering::SeqCst) {
            tracing::warn!("full sync already in flight, skipping");
            return Ok(());
        }
        let result = self.full_sync_inner().await;
        self.full_pass_in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn full_sync_inner(&self) -> Result<()> {
        logging::log_startup(&self.config.store.to_string(), &self.config.rpc_url);
        let started = Instant::now();

        // Phase 1: creators. Must complete before any gate evaluation.
        self.load_whitelisted_creators().await?;

        // Phase 2: store-scoped records. Each scan is its own branch; a
        // failed branch leaves its records absent and the pass continues.
        self.load_program_records().await;

        // Phase 3: metadata discovery, fanned out per (creator, slot).
        self.load_metadata_by_creators().await?;

        // Phase 4: settle gate membership now that creators and metadata are in.
        self.state.reevaluate_gate().await?;

        // Phase 5: edition resolution for every known mint.
        self.load_editions().await?;

        // Phase 6: store index pages and everything they reference.
        self.pager().pull_pages().await?;

        // Final pass: collapse duplicate addresses in the flat metadata list.
        self.state.dedup_metadata().await?;

        let snapshot = self.state.snapshot().await?;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        logging::log_batch(snapshot.metadata.len(), snapshot.metadata.len(), duration_ms);
        Ok(())
    }

    /// Fetches and merges every whitelisted creator.
    async fn load_whitelisted_creators(&self) -> Result<()> {
        let filters = [AccountFilter::memcmp(
            0,
            vec![MarketplaceKey::WhitelistedCreatorV1 as u8],
        )];
        let accounts = self
            .fetcher
            .fetch_program_accounts(&ids::MARKETPLACE_PROGRAM, &filters)
            .await?;

        let mut entries = Vec::with_capacity(accounts.len());
        for (address, account) in accounts {
            match AccountKind::WhitelistedCreator.decode(&account.data) {
                Ok(decoded) => entries.push((address, account, decoded)),
                Err(e) => {
                    tracing::debug!(address = %address, error = %e, "skipping undecodable creator")
                }
            }
        }
        tracing::debug!(creators = entries.len(), "whitelisted creators loaded");
        self.state.merge_batch(entries).await
    }

    /// Fetches and merges the tag-filtered program scans for phase 2.
    async fn load_program_records(&self) {
        let store = self.config.store;
        let store_filter = AccountFilter::memcmp(1, store.to_bytes().to_vec());

        let scans: Vec<(&str, Pubkey, Vec<AccountFilter>)> = vec![
            (
                "auction managers v1",
                ids::MARKETPLACE_PROGRAM,
                vec![
                    AccountFilter::memcmp(0, vec![MarketplaceKey::AuctionManagerV1 as u8]),
                    store_filter.clone(),
                ],
            ),
            (
                "auction managers v2",
                ids::MARKETPLACE_PROGRAM,
                vec![
                    AccountFilter::memcmp(0, vec![MarketplaceKey::AuctionManagerV2 as u8]),
                    store_filter,
                ],
            ),
            (
                "payout tickets",
                ids::MARKETPLACE_PROGRAM,
                vec![AccountFilter::memcmp(
                    0,
                    vec![MarketplaceKey::PayoutTicketV1 as u8],
                )],
            ),
            (
                "prize tracking tickets",
                ids::MARKETPLACE_PROGRAM,
                vec![AccountFilter::memcmp(
                    0,
                    vec![MarketplaceKey::PrizeTrackingTicketV1 as u8],
                )],
            ),
            (
                "auctions",
                ids::AUCTION_PROGRAM,
                vec![AccountFilter::memcmp(0, vec![AuctionKey::AuctionV1 as u8])],
            ),
            (
                "bidder metadata",
                ids::AUCTION_PROGRAM,
                vec![AccountFilter::memcmp(
                    0,
                    vec![AuctionKey::BidderMetadataV1 as u8],
                )],
            ),
            (
                "bidder pots",
                ids::AUCTION_PROGRAM,
                vec![AccountFilter::memcmp(0, vec![AuctionKey::BidderPotV1 as u8])],
            ),
            (
                "vaults",
                ids::VAULT_PROGRAM,
                vec![AccountFilter::memcmp(0, vec![VaultKey::VaultV1 as u8])],
            ),
            (
                "safety deposit boxes",
                ids::VAULT_PROGRAM,
                vec![AccountFilter::memcmp(
                    0,
                    vec![VaultKey::SafetyDepositBoxV1 as u8],
                )],
            ),
        ];

        for (label, program, filters) in scans {
            if let Err(e) = self.scan_and_merge(&program, &filters).await {
                logging::log_error(label, &e.to_string());
            }
        }
    }

    async fn scan_and_merge(&self, program: &Pubkey, filters: &[AccountFilter]) -> Result<()> {
        let accounts = self.fetcher.fetch_program_accounts(program, filters).await?;
        let mut entries = Vec::with_capacity(accounts.len());
        for (address, account) in accounts {
            match decode_account(&account.owner, &account.data) {
                Ok(decoded) => entries.push((address, account, decoded)),
                Err(e) => {
                    tracing::debug!(address = %address, error = %e, "skipping undecodable account")
                }
            }
        }
        self.state.merge_batch(entries).await
    }

    /// Scans metadata per (creator, creator-slot), bounded by the pipeline.
    ///
    /// A metadata account lists up to [`MAX_CREATOR_LIMIT`] creators at fixed
    /// offsets, so each whitelisted creator needs one memcmp scan per slot.
    async fn load_metadata_by_creators(&self) -> Result<()> {
        let snapshot = self.state.snapshot().await?;
        let creators: Vec<Pubkey> = snapshot
            .whitelisted_creators_by_creator
            .keys()
            .copied()
            .collect();

        let mut items = Vec::with_capacity(creators.len() * MAX_CREATOR_LIMIT);
        for creator in creators {
            for slot in 0..MAX_CREATOR_LIMIT {
                items.push((creator, slot));
            }
        }

        let report = run_pipeline(
            items,
            |(creator, slot)| {
                let fetcher = self.fetcher.clone();
                let state = self.state.clone();
                async move {
                    let filters = [
                        AccountFilter::memcmp(0, vec![MetadataKey::MetadataV1 as u8]),
                        AccountFilter::memcmp(
                            Metadata::creator_offset(slot),
                            creator.to_bytes().to_vec(),
                        ),
                    ];
                    let accounts = fetcher
                        .fetch_program_accounts(&ids::TOKEN_METADATA_PROGRAM, &filters)
                        .await?;
                    let mut entries = Vec::with_capacity(accounts.len());
                    for (address, account) in accounts {
                        match AccountKind::Metadata.decode(&account.data) {
                            Ok(decoded) => entries.push((address, account, decoded)),
                            Err(e) => {
                                tracing::debug!(address = %address, error = %e, "skipping undecodable metadata");
                            }
                        }
                    }
                    state.merge_batch(entries).await
                }
            },
            &self.config.pipeline,
        )
        .await;

        tracing::debug!(
            succeeded = report.succeeded,
            failed = report.failed,
            "metadata discovery complete"
        );
        Ok(())
    }

    /// Resolves the edition account for every known metadata mint.
    ///
    /// Edition addresses are derived, never stored on the metadata record, so
    /// this is follow-up I/O: derive, batch-fetch at the protocol ceiling,
    /// decode master editions and limited editions by tag, link back.
    async fn load_editions(&self) -> Result<()> {
        let snapshot = self.state.snapshot().await?;
        let mut seen = HashSet::new();
        let mints: Vec<Pubkey> = snapshot
            .metadata
            .iter()
            .map(|record| record.decoded.mint)
            .filter(|mint| seen.insert(*mint))
            .collect();

        let pairs: Vec<(Pubkey, Pubkey)> = mints
            .into_iter()
            .map(|mint| (mint, crate::utils::pda::edition_address(&mint)))
            .collect();

        let chunks: Vec<Vec<(Pubkey, Pubkey)>> = pairs
            .chunks(MAX_MULTIPLE_ACCOUNTS)
            .map(<[(Pubkey, Pubkey)]>::to_vec)
            .collect();

        let report = run_pipeline(
            chunks,
            |chunk| {
                let fetcher = self.fetcher.clone();
                let state = self.state.clone();
                async move {
                    let addresses: Vec<Pubkey> =
                        chunk.iter().map(|(_, address)| *address).collect();
                    let accounts = fetcher.fetch_multiple_accounts(&addresses).await?;
                    for ((mint, address), account) in chunk.into_iter().zip(accounts) {
                        let Some(account) = account else { continue };
                        match decode_account(&account.owner, &account.data) {
                            Ok(decoded @ DecodedAccount::MasterEdition(_)) => {
                                state.merge(address, account, decoded).await?;
                                state.link_master_edition(address, mint).await?;
                            }
                            Ok(decoded @ DecodedAccount::Edition(_)) => {
                                state.merge(address, account, decoded).await?;
                            }
                            Ok(_) => {
                                tracing::debug!(address = %address, "derived edition address held unexpected record");
                            }
                            Err(e) => {
                                tracing::debug!(address = %address, error = %e, "skipping undecodable edition");
                            }
                        }
                    }
                    Ok(())
                }
            },
            &self.config.pipeline,
        )
        .await;

        tracing::debug!(
            succeeded = report.succeeded,
            failed = report.failed,
            "edition resolution complete"
        );
        Ok(())
    }
}
