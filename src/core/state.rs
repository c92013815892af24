//! The aggregate market state: cross-referenced indexed maps assembled from
//! decoded records.
//!
//! Merge semantics are deliberately simple: unconditional last-write-wins
//! upserts, no versioning, no internal conflict resolution. Callers are
//! responsible for applying upserts in a logically consistent order within a
//! pass — in particular, whitelisted creators must be merged before metadata
//! gating is trusted, and [`MarketState::reevaluate_metadata_gate`] must run
//! after any pass that may have fetched metadata ahead of its creators.
//!
//! All mutation is serialized through the owning task in
//! [`crate::core::service`]; this module holds the data and the pure merge
//! logic so it can be tested synchronously.

use std::collections::{HashMap, HashSet};

use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;

use crate::core::registry::DecodedAccount;
use crate::types::{
    AccountRecord, Auction, AuctionCache, AuctionManager, BidderMetadata, BidderPot, Edition,
    MasterEdition, Metadata, PayoutTicket, PrizeTrackingTicket, SafetyDepositBox, StoreIndexer,
    Vault, WhitelistedCreator,
};

/// The cross-referenced in-memory index of everything a storefront renders.
///
/// Records are created on first successful decode, updated by unconditional
/// overwrite on every subsequent pass, and removed only when the creator gate
/// fails on re-evaluation. Nothing here expires on a timer.
#[derive(Debug, Clone, Default)]
pub struct MarketState {
    /// Flat metadata list, appended without dedup during a pass; a final
    /// [`Self::dedup_metadata`] pass removes duplicate addresses.
    pub metadata: Vec<AccountRecord<Metadata>>,
    /// Gated index: contains a record only while at least one of its creators
    /// is present (verified + activated) in the whitelist.
    pub metadata_by_mint: HashMap<Pubkey, AccountRecord<Metadata>>,
    /// Metadata grouped per auction, in auction-cache order.
    pub metadata_by_auction: HashMap<Pubkey, Vec<AccountRecord<Metadata>>>,
    /// Metadata keyed by its master-edition address (linked in
    /// post-processing once editions are resolved).
    pub metadata_by_master_edition: HashMap<Pubkey, AccountRecord<Metadata>>,
    pub master_editions: HashMap<Pubkey, AccountRecord<MasterEdition>>,
    pub master_editions_by_printing_mint: HashMap<Pubkey, AccountRecord<MasterEdition>>,
    pub master_editions_by_one_time_auth_mint: HashMap<Pubkey, AccountRecord<MasterEdition>>,
    pub editions: HashMap<Pubkey, AccountRecord<Edition>>,
    pub auctions: HashMap<Pubkey, AccountRecord<Auction>>,
    pub auction_managers_by_auction: HashMap<Pubkey, AccountRecord<AuctionManager>>,
    pub bidder_metadata_by_auction_and_bidder:
        HashMap<(Pubkey, Pubkey), AccountRecord<BidderMetadata>>,
    pub bidder_pots_by_auction_and_bidder: HashMap<(Pubkey, Pubkey), AccountRecord<BidderPot>>,
    pub vaults: HashMap<Pubkey, AccountRecord<Vault>>,
    pub safety_deposit_boxes_by_vault_and_index:
        HashMap<(Pubkey, u8), AccountRecord<SafetyDepositBox>>,
    /// Keyed by the creator's wallet address, not the account address.
    pub whitelisted_creators_by_creator: HashMap<Pubkey, AccountRecord<WhitelistedCreator>>,
    pub payout_tickets: HashMap<Pubkey, AccountRecord<PayoutTicket>>,
    pub prize_tracking_tickets: HashMap<Pubkey, AccountRecord<PrizeTrackingTicket>>,
    /// Always sorted ascending by page number, at most one entry per page.
    pub store_indexer: Vec<AccountRecord<StoreIndexer>>,
    pub auction_caches: HashMap<Pubkey, AccountRecord<AuctionCache>>,
}

impl MarketState {
    /// Upserts one decoded record into the appropriate index maps.
    ///
    /// Unconditional replace; the last write wins. Metadata additionally
    /// applies the whitelist gate for `metadata_by_mint` membership.
    pub fn merge(&mut self, address: Pubkey, account: Account, decoded: DecodedAccount) {
        match decoded {
            DecodedAccount::Metadata(meta) => {
                let record = AccountRecord::new(address, account, meta);
                self.upsert_metadata(record);
            }
            DecodedAccount::Edition(edition) => {
                self.editions
                    .insert(address, AccountRecord::new(address, account, edition));
            }
            DecodedAccount::MasterEdition(me) => {
                let record = AccountRecord::new(address, account, me);
                if let MasterEdition::V1(v1) = &record.decoded {
                    self.master_editions_by_printing_mint
                        .insert(v1.printing_mint, record.clone());
                    self.master_editions_by_one_time_auth_mint
                        .insert(v1.one_time_printing_authorization_mint, record.clone());
                }
                self.master_editions.insert(address, record);
            }
            DecodedAccount::Vault(vault) => {
                self.vaults
                    .insert(address, AccountRecord::new(address, account, vault));
            }
            DecodedAccount::SafetyDepositBox(sdb) => {
                let key = (sdb.vault, sdb.order);
                self.safety_deposit_boxes_by_vault_and_index
                    .insert(key, AccountRecord::new(address, account, sdb));
            }
            DecodedAccount::Auction(auction) => {
                self.auctions
                    .insert(address, AccountRecord::new(address, account, auction));
            }
            DecodedAccount::BidderMetadata(bm) => {
                let key = (bm.auction, bm.bidder);
                self.bidder_metadata_by_auction_and_bidder
                    .insert(key, AccountRecord::new(address, account, bm));
            }
            DecodedAccount::BidderPot(pot) => {
                let key = (pot.auction, pot.bidder);
                self.bidder_pots_by_auction_and_bidder
                    .insert(key, AccountRecord::new(address, account, pot));
            }
            DecodedAccount::WhitelistedCreator(creator) => {
                let key = creator.address;
                self.whitelisted_creators_by_creator
                    .insert(key, AccountRecord::new(address, account, creator));
            }
            DecodedAccount::AuctionManager(manager) => {
                let key = manager.auction();
                self.auction_managers_by_auction
                    .insert(key, AccountRecord::new(address, account, manager));
            }
            DecodedAccount::PayoutTicket(ticket) => {
                self.payout_tickets
                    .insert(address, AccountRecord::new(address, account, ticket));
            }
            DecodedAccount::PrizeTrackingTicket(ticket) => {
                self.prize_tracking_tickets
                    .insert(address, AccountRecord::new(address, account, ticket));
            }
            DecodedAccount::StoreIndexer(page) => {
                self.replace_indexer_page(AccountRecord::new(address, account, page));
            }
            DecodedAccount::AuctionCache(cache) => {
                self.auction_caches
                    .insert(address, AccountRecord::new(address, account, cache));
            }
        }
    }

    /// Whether `meta` currently passes the whitelist gate: at least one of its
    /// creators is verified on the record and activated on the whitelist.
    #[must_use]
    pub fn passes_gate(&self, meta: &Metadata) -> bool {
        meta.data.creators.as_ref().is_some_and(|creators| {
            creators.iter().any(|c| {
                c.verified
                    && self
                        .whitelisted_creators_by_creator
                        .get(&c.address)
                        .is_some_and(|w| w.decoded.activated)
            })
        })
    }

    fn upsert_metadata(&mut self, record: AccountRecord<Metadata>) {
        if self.passes_gate(&record.decoded) {
            self.metadata_by_mint
                .insert(record.decoded.mint, record.clone());
        } else {
            // Frequently the creators simply have not been fetched yet; the
            // gate re-evaluation after the creator phase settles membership.
            self.metadata_by_mint.remove(&record.decoded.mint);
        }
        self.metadata.push(record);
    }

    /// Replaces any existing entry sharing the page number, then re-sorts
    /// ascending by page number.
    fn replace_indexer_page(&mut self, record: AccountRecord<StoreIndexer>) {
        self.store_indexer
            .retain(|existing| existing.decoded.page != record.decoded.page);
        self.store_indexer.push(record);
        self.store_indexer
            .sort_by_key(|record| record.decoded.page);
    }

    /// Re-checks every known metadata record against the current whitelist.
    ///
    /// Records whose creators are absent are deleted from `metadata_by_mint`;
    /// records that now pass are inserted. The flat `metadata` list is left
    /// untouched until [`Self::dedup_metadata`]. Required because metadata is
    /// frequently fetched before its creators are known.
    pub fn reevaluate_metadata_gate(&mut self) {
        let mut passing: HashMap<Pubkey, AccountRecord<Metadata>> = HashMap::new();
        for record in &self.metadata {
            if self.passes_gate(&record.decoded) {
                // Later entries win, matching upsert order.
                passing.insert(record.decoded.mint, record.clone());
            }
        }
        self.metadata_by_mint
            .retain(|mint, _| passing.contains_key(mint));
        for (mint, record) in passing {
            self.metadata_by_mint.insert(mint, record);
        }
    }

    /// Removes duplicate addresses from the flat metadata list, keeping the
    /// first occurrence.
    pub fn dedup_metadata(&mut self) {
        let mut seen: HashSet<Pubkey> = HashSet::with_capacity(self.metadata.len());
        self.metadata.retain(|record| seen.insert(record.address));
    }

    /// Stores the metadata records rendered for `auction`, in cache order.
    pub fn set_auction_metadata(
        &mut self,
        auction: Pubkey,
        records: Vec<AccountRecord<Metadata>>,
    ) {
        self.metadata_by_auction.insert(auction, records);
    }

    /// Cross-links a resolved master edition back to the metadata of `mint`.
    pub fn link_master_edition(&mut self, master_edition: Pubkey, mint: Pubkey) {
        if let Some(record) = self.metadata_by_mint.get(&mint) {
            self.metadata_by_master_edition
                .insert(master_edition, record.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Creator, MarketplaceKey, MetadataData, MetadataKey};

    fn empty_account(owner: Pubkey) -> Account {
        Account {
            lamports: 1,
            data: vec![],
            owner,
            executable: false,
            rent_epoch: 0,
        }
    }

    fn metadata_with_creator(creator: Pubkey) -> Metadata {
        Metadata {
            key: MetadataKey::MetadataV1,
            update_authority: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            data: MetadataData {
                name: "piece".to_string(),
                symbol: "P".to_string(),
                uri: "https://example.org/p.json".to_string(),
                seller_fee_basis_points: 0,
                creators: Some(vec![Creator {
                    address: creator,
                    verified: true,
                    share: 100,
                }]),
            },
            primary_sale_happened: false,
            is_mutable: true,
        }
    }

    fn whitelisted(creator: Pubkey, activated: bool) -> WhitelistedCreator {
        WhitelistedCreator {
            key: MarketplaceKey::WhitelistedCreatorV1,
            address: creator,
            activated,
        }
    }

    fn indexer_page(page: u64) -> DecodedAccount {
        DecodedAccount::StoreIndexer(StoreIndexer {
            key: MarketplaceKey::StoreIndexerV1,
            store: Pubkey::new_unique(),
            page,
            auction_caches: vec![],
        })
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut state = MarketState::default();
        let creator = Pubkey::new_unique();
        let creator_account = Pubkey::new_unique();
        let meta = metadata_with_creator(creator);
        let meta_address = Pubkey::new_unique();

        state.merge(
            creator_account,
            empty_account(Pubkey::default()),
            DecodedAccount::WhitelistedCreator(whitelisted(creator, true)),
        );
        for _ in 0..2 {
            state.merge(
                meta_address,
                empty_account(Pubkey::default()),
                DecodedAccount::Metadata(meta.clone()),
            );
        }
        state.dedup_metadata();

        let mut once = MarketState::default();
        once.merge(
            creator_account,
            empty_account(Pubkey::default()),
            DecodedAccount::WhitelistedCreator(whitelisted(creator, true)),
        );
        once.merge(
            meta_address,
            empty_account(Pubkey::default()),
            DecodedAccount::Metadata(meta.clone()),
        );
        once.dedup_metadata();

        assert_eq!(state.metadata.len(), once.metadata.len());
        assert_eq!(
            state.metadata_by_mint.get(&meta.mint),
            once.metadata_by_mint.get(&meta.mint)
        );
    }

    #[test]
    fn test_gate_blocks_metadata_without_creator() {
        let mut state = MarketState::default();
        let meta = metadata_with_creator(Pubkey::new_unique());
        state.merge(
            Pubkey::new_unique(),
            empty_account(Pubkey::default()),
            DecodedAccount::Metadata(meta.clone()),
        );
        assert!(state.metadata_by_mint.is_empty());
        // Still present in the flat list until a dedup pass
        assert_eq!(state.metadata.len(), 1);
    }

    #[test]
    fn test_gate_reevaluation_admits_late_creator() {
        let mut state = MarketState::default();
        let creator = Pubkey::new_unique();
        let meta = metadata_with_creator(creator);

        // Metadata arrives before its creator is known
        state.merge(
            Pubkey::new_unique(),
            empty_account(Pubkey::default()),
            DecodedAccount::Metadata(meta.clone()),
        );
        assert!(!state.metadata_by_mint.contains_key(&meta.mint));

        state.merge(
            Pubkey::new_unique(),
            empty_account(Pubkey::default()),
            DecodedAccount::WhitelistedCreator(whitelisted(creator, true)),
        );
        state.reevaluate_metadata_gate();
        assert!(state.metadata_by_mint.contains_key(&meta.mint));
    }

    #[test]
    fn test_gate_reevaluation_removes_delisted_creator() {
        let mut state = MarketState::default();
        let creator = Pubkey::new_unique();
        let meta = metadata_with_creator(creator);
        let creator_account = Pubkey::new_unique();

        state.merge(
            creator_account,
            empty_account(Pubkey::default()),
            DecodedAccount::WhitelistedCreator(whitelisted(creator, true)),
        );
        state.merge(
            Pubkey::new_unique(),
            empty_account(Pubkey::default()),
            DecodedAccount::Metadata(meta.clone()),
        );
        assert!(state.metadata_by_mint.contains_key(&meta.mint));

        // Second pass observes the creator deactivated; raw metadata unchanged
        state.merge(
            creator_account,
            empty_account(Pubkey::default()),
            DecodedAccount::WhitelistedCreator(whitelisted(creator, false)),
        );
        state.reevaluate_metadata_gate();
        assert!(!state.metadata_by_mint.contains_key(&meta.mint));
        // The flat list keeps the record (both passes) until dedup
        assert_eq!(state.metadata.len(), 2);
        state.dedup_metadata();
        assert_eq!(state.metadata.len(), 2); // distinct addresses survive dedup
    }

    #[test]
    fn test_unverified_creator_does_not_open_gate() {
        let mut state = MarketState::default();
        let creator = Pubkey::new_unique();
        let mut meta = metadata_with_creator(creator);
        meta.data.creators.as_mut().unwrap()[0].verified = false;

        state.merge(
            Pubkey::new_unique(),
            empty_account(Pubkey::default()),
            DecodedAccount::WhitelistedCreator(whitelisted(creator, true)),
        );
        state.merge(
            Pubkey::new_unique(),
            empty_account(Pubkey::default()),
            DecodedAccount::Metadata(meta.clone()),
        );
        assert!(!state.metadata_by_mint.contains_key(&meta.mint));
    }

    #[test]
    fn test_indexer_pages_sorted_and_unique() {
        let mut state = MarketState::default();
        for page in [2u64, 0, 1, 1] {
            state.merge(
                Pubkey::new_unique(),
                empty_account(Pubkey::default()),
                indexer_page(page),
            );
        }
        let pages: Vec<u64> = state
            .store_indexer
            .iter()
            .map(|record| record.decoded.page)
            .collect();
        assert_eq!(pages, vec![0, 1, 2]);
    }

    #[test]
    fn test_dedup_metadata_keeps_first_occurrence() {
        let mut state = MarketState::default();
        let creator = Pubkey::new_unique();
        state.merge(
            Pubkey::new_unique(),
            empty_account(Pubkey::default()),
            DecodedAccount::WhitelistedCreator(whitelisted(creator, true)),
        );
        let meta = metadata_with_creator(creator);
        let address = Pubkey::new_unique();
        for _ in 0..3 {
            state.merge(
                address,
                empty_account(Pubkey::default()),
                DecodedAccount::Metadata(meta.clone()),
            );
        }
        assert_eq!(state.metadata.len(), 3);
        state.dedup_metadata();
        assert_eq!(state.metadata.len(), 1);
    }
}
