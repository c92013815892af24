//! Auction program layouts: auctions, bidder metadata, bidder pots.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use super::try_from_slice_checked;
use crate::utils::error::Result;

/// Account tag bytes for the auction program.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum AuctionKey {
    Uninitialized = 0,
    AuctionV1 = 1,
    BidderMetadataV1 = 2,
    BidderPotV1 = 3,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionState {
    Created,
    Started,
    Ended,
}

/// The reserve price rule for an auction.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum PriceFloor {
    /// No floor; the payload is unused padding kept for layout stability.
    None([u8; 32]),
    /// Minimum acceptable bid in the auction's token mint.
    Minimum(u64),
    /// Hash commitment to a hidden floor.
    Blinded([u8; 32]),
}

/// A single recorded bid.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Bid {
    pub bidder: Pubkey,
    pub amount: u64,
}

/// The ordered bid book, capped at `max` winners.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum BidState {
    EnglishAuction { bids: Vec<Bid>, max: u64 },
    OpenEdition { bids: Vec<Bid>, max: u64 },
}

impl BidState {
    /// Number of bids currently recorded.
    #[must_use]
    pub fn bid_count(&self) -> usize {
        match self {
            BidState::EnglishAuction { bids, .. } | BidState::OpenEdition { bids, .. } => {
                bids.len()
            }
        }
    }
}

/// An auction account.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Auction {
    pub key: AuctionKey,
    /// Authority allowed to settle the auction.
    pub authority: Pubkey,
    /// Mint bids are denominated in.
    pub token_mint: Pubkey,
    /// Unix timestamp of the most recent bid, if any.
    pub last_bid: Option<i64>,
    /// Unix timestamp the auction ended at, if ended.
    pub ended_at: Option<i64>,
    /// Scheduled end, if any.
    pub end_auction_at: Option<i64>,
    /// Gap-time extension window applied after late bids.
    pub end_auction_gap: Option<i64>,
    pub price_floor: PriceFloor,
    pub state: AuctionState,
    pub bid_state: BidState,
}

impl Auction {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, AuctionKey::AuctionV1 as u8)
    }
}

/// Per-bidder bookkeeping for one auction, addressed by `(auction, bidder)`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct BidderMetadata {
    pub key: AuctionKey,
    pub bidder: Pubkey,
    pub auction: Pubkey,
    /// Amount of the last bid.
    pub last_bid: u64,
    pub last_bid_timestamp: i64,
    /// Whether the bid was cancelled before settlement.
    pub cancelled: bool,
}

impl BidderMetadata {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, AuctionKey::BidderMetadataV1 as u8)
    }
}

/// Escrow account holding one bidder's funds for one auction.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct BidderPot {
    pub key: AuctionKey,
    /// The token account holding the escrowed funds.
    pub bidder_pot: Pubkey,
    pub bidder: Pubkey,
    pub auction: Pubkey,
    /// Set once the pot has been drained at settlement.
    pub emptied: bool,
}

impl BidderPot {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, AuctionKey::BidderPotV1 as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_auction() -> Auction {
        Auction {
            key: AuctionKey::AuctionV1,
            authority: Pubkey::new_unique(),
            token_mint: Pubkey::new_unique(),
            last_bid: Some(1_650_000_000),
            ended_at: None,
            end_auction_at: Some(1_650_100_000),
            end_auction_gap: Some(300),
            price_floor: PriceFloor::Minimum(1_000_000),
            state: AuctionState::Started,
            bid_state: BidState::EnglishAuction {
                bids: vec![Bid {
                    bidder: Pubkey::new_unique(),
                    amount: 2_000_000,
                }],
                max: 1,
            },
        }
    }

    #[test]
    fn test_auction_roundtrip() {
        let auction = sample_auction();
        let bytes = borsh::to_vec(&auction).unwrap();
        let decoded = Auction::decode(&bytes).unwrap();
        assert_eq!(decoded, auction);
        assert_eq!(decoded.bid_state.bid_count(), 1);
    }

    #[test]
    fn test_bidder_metadata_roundtrip() {
        let meta = BidderMetadata {
            key: AuctionKey::BidderMetadataV1,
            bidder: Pubkey::new_unique(),
            auction: Pubkey::new_unique(),
            last_bid: 500,
            last_bid_timestamp: 1_650_000_123,
            cancelled: false,
        };
        let bytes = borsh::to_vec(&meta).unwrap();
        assert_eq!(BidderMetadata::decode(&bytes).unwrap(), meta);
    }

    #[test]
    fn test_auction_rejects_pot_tag() {
        let auction = sample_auction();
        let mut bytes = borsh::to_vec(&auction).unwrap();
        bytes[0] = AuctionKey::BidderPotV1 as u8;
        assert!(Auction::decode(&bytes).is_err());
    }
}
