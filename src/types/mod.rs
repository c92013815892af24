//! Typed on-chain records and their fixed binary layouts.
//!
//! Every account kind consumed by the sync layer carries a leading tag byte
//! identifying the variant, followed by borsh-encoded fixed-width
//! little-endian integers and length-prefixed strings/vectors. Decoding is
//! pure and synchronous; any follow-up I/O belongs to post-processing, never
//! to decode itself.

use borsh::BorshDeserialize;

use crate::utils::error::{Result, SyncError};

pub mod auction;
pub mod marketplace;
pub mod metadata;
pub mod record;
pub mod vault;

pub use auction::{Auction, AuctionKey, AuctionState, Bid, BidState, BidderMetadata, BidderPot, PriceFloor};
pub use marketplace::{
    AuctionCache, AuctionManager, AuctionManagerStateV1, AuctionManagerStateV2,
    AuctionManagerStatus, AuctionManagerV1, AuctionManagerV2, MarketplaceKey, PayoutTicket,
    PrizeTrackingTicket, StoreIndexer, WhitelistedCreator,
};
pub use metadata::{
    Creator, Edition, MasterEdition, MasterEditionV1, MasterEditionV2, Metadata, MetadataData,
    MetadataKey,
};
pub use record::AccountRecord;
pub use vault::{SafetyDepositBox, Vault, VaultKey, VaultState};

/// Well-known program ids for the marketplace's on-chain programs.
pub mod ids {
    use solana_sdk::pubkey;
    use solana_sdk::pubkey::Pubkey;

    /// Token metadata program (metadata, editions, master editions).
    pub const TOKEN_METADATA_PROGRAM: Pubkey =
        pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");
    /// Token vault program (vaults, safety deposit boxes).
    pub const VAULT_PROGRAM: Pubkey = pubkey!("vau1zxA2LbssAUEF7Gpw91zMM1LvXrvpzJtmZ58rPsn");
    /// Auction program (auctions, bidder metadata, bidder pots).
    pub const AUCTION_PROGRAM: Pubkey = pubkey!("auctxRXPeJoc4817jDhf4HbjnhEcr1cCXenosMhK5R8");
    /// Marketplace program (store, whitelisted creators, auction managers,
    /// payout tickets, indexer pages, auction caches).
    pub const MARKETPLACE_PROGRAM: Pubkey = pubkey!("p1exdMJcjVao65QdewkaZRUnU6VPSXhus9n2GzWfh98");
    /// Wrapped SOL mint, used for the synthetic native-balance record.
    pub const NATIVE_MINT: Pubkey = pubkey!("So11111111111111111111111111111111111111112");
}

/// Deserializes `T` from account data after checking the leading tag byte.
///
/// Trailing bytes beyond the borsh payload are tolerated (accounts are
/// fixed-size allocations padded with zeros). Truncated or tag-mismatched
/// input fails without partially populating anything.
pub(crate) fn try_from_slice_checked<T: BorshDeserialize>(data: &[u8], tag: u8) -> Result<T> {
    match data.first() {
        Some(&found) if found == tag => {}
        Some(&found) => {
            return Err(SyncError::DecodeError(format!(
                "account tag mismatch: found {found}, expected {tag}"
            )));
        }
        None => return Err(SyncError::DecodeError("empty account data".to_string())),
    }

    let mut slice = data;
    T::deserialize(&mut slice).map_err(|e| SyncError::DecodeError(e.to_string()))
}

/// Strips the trailing NUL padding the on-chain program writes into
/// fixed-capacity strings.
#[must_use]
pub fn trim_nul(s: &str) -> &str {
    s.trim_end_matches('\0')
}
