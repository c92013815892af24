//! Marketplace program layouts: whitelisted creators, auction managers,
//! payout and prize-tracking tickets, store-indexer pages, auction caches.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use super::try_from_slice_checked;
use crate::utils::error::Result;

/// Account tag bytes for the marketplace program.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum MarketplaceKey {
    Uninitialized = 0,
    StoreV1 = 3,
    WhitelistedCreatorV1 = 4,
    PayoutTicketV1 = 5,
    AuctionManagerV1 = 7,
    PrizeTrackingTicketV1 = 8,
    AuctionManagerV2 = 10,
    StoreIndexerV1 = 13,
    AuctionCacheV1 = 14,
}

/// A creator pre-approved as an eligible royalty creator for a store.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct WhitelistedCreator {
    pub key: MarketplaceKey,
    pub address: Pubkey,
    /// Deactivated entries stay on chain but no longer open the gate.
    pub activated: bool,
}

impl WhitelistedCreator {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, MarketplaceKey::WhitelistedCreatorV1 as u8)
    }
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionManagerStatus {
    Initialized,
    Validated,
    Running,
    Disbursing,
    Finished,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuctionManagerStateV1 {
    pub status: AuctionManagerStatus,
    pub winning_config_items_validated: u8,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuctionManagerStateV2 {
    pub status: AuctionManagerStatus,
    pub safety_config_items_validated: u64,
    pub bids_pushed_to_accept_payment: u64,
    pub has_participation: bool,
}

/// First-generation auction manager.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuctionManagerV1 {
    pub key: MarketplaceKey,
    pub store: Pubkey,
    pub authority: Pubkey,
    pub auction: Pubkey,
    pub vault: Pubkey,
    pub accept_payment: Pubkey,
    pub state: AuctionManagerStateV1,
}

impl AuctionManagerV1 {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, MarketplaceKey::AuctionManagerV1 as u8)
    }
}

/// Current-generation auction manager.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuctionManagerV2 {
    pub key: MarketplaceKey,
    pub store: Pubkey,
    pub authority: Pubkey,
    pub auction: Pubkey,
    pub vault: Pubkey,
    pub accept_payment: Pubkey,
    pub state: AuctionManagerStateV2,
}

impl AuctionManagerV2 {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, MarketplaceKey::AuctionManagerV2 as u8)
    }
}

/// Either generation of auction manager, unified for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionManager {
    V1(AuctionManagerV1),
    V2(AuctionManagerV2),
}

impl AuctionManager {
    #[must_use]
    pub fn store(&self) -> Pubkey {
        match self {
            AuctionManager::V1(m) => m.store,
            AuctionManager::V2(m) => m.store,
        }
    }

    #[must_use]
    pub fn auction(&self) -> Pubkey {
        match self {
            AuctionManager::V1(m) => m.auction,
            AuctionManager::V2(m) => m.auction,
        }
    }

    #[must_use]
    pub fn vault(&self) -> Pubkey {
        match self {
            AuctionManager::V1(m) => m.vault,
            AuctionManager::V2(m) => m.vault,
        }
    }

    #[must_use]
    pub fn status(&self) -> AuctionManagerStatus {
        match self {
            AuctionManager::V1(m) => m.state.status,
            AuctionManager::V2(m) => m.state.status,
        }
    }
}

/// Record of one royalty payout at settlement.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PayoutTicket {
    pub key: MarketplaceKey,
    pub recipient: Pubkey,
    pub amount_paid: u64,
}

impl PayoutTicket {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, MarketplaceKey::PayoutTicketV1 as u8)
    }
}

/// Tracks how many prints of a master edition an auction has redeemed.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PrizeTrackingTicket {
    pub key: MarketplaceKey,
    pub metadata: Pubkey,
    pub supply_snapshot: u64,
    pub expected_redemptions: u64,
    pub redemptions: u64,
}

impl PrizeTrackingTicket {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, MarketplaceKey::PrizeTrackingTicketV1 as u8)
    }
}

/// One page of the store's auction-cache index, chained by page number.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreIndexer {
    pub key: MarketplaceKey,
    pub store: Pubkey,
    pub page: u64,
    /// Auction-cache addresses listed on this page.
    pub auction_caches: Vec<Pubkey>,
}

impl StoreIndexer {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, MarketplaceKey::StoreIndexerV1 as u8)
    }
}

/// Denormalized per-auction summary written at listing time so storefronts
/// can render an auction without walking every underlying account.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuctionCache {
    pub key: MarketplaceKey,
    pub store: Pubkey,
    /// Listing timestamp, used for page ordering on chain.
    pub timestamp: i64,
    /// Metadata accounts for the items on sale.
    pub metadata: Vec<Pubkey>,
    pub auction: Pubkey,
    pub vault: Pubkey,
    pub auction_manager: Pubkey,
}

impl AuctionCache {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, MarketplaceKey::AuctionCacheV1 as u8)
    }
}
