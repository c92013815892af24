//! Account decoder registry.
//!
//! A fixed [`AccountKind`] enum maps every decodable account kind to its
//! decoder. Decoders are pure and synchronous, returning a typed
//! [`DecodedAccount`] or a decode error — they never partially populate and
//! never perform I/O.

use solana_sdk::pubkey::Pubkey;

use crate::types::{
    ids, Auction, AuctionCache, AuctionKey, AuctionManager, AuctionManagerV1, AuctionManagerV2,
    BidderMetadata, BidderPot, Edition, MasterEdition, MasterEditionV1, MasterEditionV2,
    MarketplaceKey, Metadata, MetadataKey, PayoutTicket, PrizeTrackingTicket, SafetyDepositBox,
    StoreIndexer, Vault, VaultKey, WhitelistedCreator,
};
use crate::utils::error::{Result, SyncError};

/// Every account kind the sync layer can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    Metadata,
    Edition,
    MasterEditionV1,
    MasterEditionV2,
    Vault,
    SafetyDepositBox,
    Auction,
    BidderMetadata,
    BidderPot,
    WhitelistedCreator,
    AuctionManagerV1,
    AuctionManagerV2,
    PayoutTicket,
    PrizeTrackingTicket,
    StoreIndexer,
    AuctionCache,
}

/// A successfully decoded account record of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedAccount {
    Metadata(Metadata),
    Edition(Edition),
    MasterEdition(MasterEdition),
    Vault(Vault),
    SafetyDepositBox(SafetyDepositBox),
    Auction(Auction),
    BidderMetadata(BidderMetadata),
    BidderPot(BidderPot),
    WhitelistedCreator(WhitelistedCreator),
    AuctionManager(AuctionManager),
    PayoutTicket(PayoutTicket),
    PrizeTrackingTicket(PrizeTrackingTicket),
    StoreIndexer(StoreIndexer),
    AuctionCache(AuctionCache),
}

impl AccountKind {
    /// Decodes raw account data as this kind.
    ///
    /// Fails on truncated or tag-mismatched input without partially
    /// populating anything.
    pub fn decode(self, data: &[u8]) -> Result<DecodedAccount> {
        Ok(match self {
            AccountKind::Metadata => DecodedAccount::Metadata(Metadata::decode(data)?),
            AccountKind::Edition => DecodedAccount::Edition(Edition::decode(data)?),
            AccountKind::MasterEditionV1 => {
                DecodedAccount::MasterEdition(MasterEdition::V1(MasterEditionV1::decode(data)?))
            }
            AccountKind::MasterEditionV2 => {
                DecodedAccount::MasterEdition(MasterEdition::V2(MasterEditionV2::decode(data)?))
            }
            AccountKind::Vault => DecodedAccount::Vault(Vault::decode(data)?),
            AccountKind::SafetyDepositBox => {
                DecodedAccount::SafetyDepositBox(SafetyDepositBox::decode(data)?)
            }
            AccountKind::Auction => DecodedAccount::Auction(Auction::decode(data)?),
            AccountKind::BidderMetadata => {
                DecodedAccount::BidderMetadata(BidderMetadata::decode(data)?)
            }
            AccountKind::BidderPot => DecodedAccount::BidderPot(BidderPot::decode(data)?),
            AccountKind::WhitelistedCreator => {
                DecodedAccount::WhitelistedCreator(WhitelistedCreator::decode(data)?)
            }
            AccountKind::AuctionManagerV1 => {
                DecodedAccount::AuctionManager(AuctionManager::V1(AuctionManagerV1::decode(data)?))
            }
            AccountKind::AuctionManagerV2 => {
                DecodedAccount::AuctionManager(AuctionManager::V2(AuctionManagerV2::decode(data)?))
            }
            AccountKind::PayoutTicket => DecodedAccount::PayoutTicket(PayoutTicket::decode(data)?),
            AccountKind::PrizeTrackingTicket => {
                DecodedAccount::PrizeTrackingTicket(PrizeTrackingTicket::decode(data)?)
            }
            AccountKind::StoreIndexer => DecodedAccount::StoreIndexer(StoreIndexer::decode(data)?),
            AccountKind::AuctionCache => DecodedAccount::AuctionCache(AuctionCache::decode(data)?),
        })
    }

    /// Resolves the account kind from the owning program and leading tag byte.
    ///
    /// Returns a decode error for unknown owners or tags the sync layer does
    /// not consume.
    pub fn from_owner_and_tag(owner: &Pubkey, data: &[u8]) -> Result<Self> {
        let tag = *data
            .first()
            .ok_or_else(|| SyncError::DecodeError("empty account data".to_string()))?;

        let kind = if *owner == ids::TOKEN_METADATA_PROGRAM {
            match tag {
                t if t == MetadataKey::MetadataV1 as u8 => AccountKind::Metadata,
                t if t == MetadataKey::EditionV1 as u8 => AccountKind::Edition,
                t if t == MetadataKey::MasterEditionV1 as u8 => AccountKind::MasterEditionV1,
                t if t == MetadataKey::MasterEditionV2 as u8 => AccountKind::MasterEditionV2,
                _ => return Err(unsupported(owner, tag)),
            }
        } else if *owner == ids::VAULT_PROGRAM {
            match tag {
                t if t == VaultKey::VaultV1 as u8 => AccountKind::Vault,
                t if t == VaultKey::SafetyDepositBoxV1 as u8 => AccountKind::SafetyDepositBox,
                _ => return Err(unsupported(owner, tag)),
            }
        } else if *owner == ids::AUCTION_PROGRAM {
            match tag {
                t if t == AuctionKey::AuctionV1 as u8 => AccountKind::Auction,
                t if t == AuctionKey::BidderMetadataV1 as u8 => AccountKind::BidderMetadata,
                t if t == AuctionKey::BidderPotV1 as u8 => AccountKind::BidderPot,
                _ => return Err(unsupported(owner, tag)),
            }
        } else if *owner == ids::MARKETPLACE_PROGRAM {
            match tag {
                t if t == MarketplaceKey::WhitelistedCreatorV1 as u8 => {
                    AccountKind::WhitelistedCreator
                }
                t if t == MarketplaceKey::AuctionManagerV1 as u8 => AccountKind::AuctionManagerV1,
                t if t == MarketplaceKey::AuctionManagerV2 as u8 => AccountKind::AuctionManagerV2,
                t if t == MarketplaceKey::PayoutTicketV1 as u8 => AccountKind::PayoutTicket,
                t if t == MarketplaceKey::PrizeTrackingTicketV1 as u8 => {
                    AccountKind::PrizeTrackingTicket
                }
                t if t == MarketplaceKey::StoreIndexerV1 as u8 => AccountKind::StoreIndexer,
                t if t == MarketplaceKey::AuctionCacheV1 as u8 => AccountKind::AuctionCache,
                _ => return Err(unsupported(owner, tag)),
            }
        } else {
            return Err(SyncError::DecodeError(format!(
                "account owner {owner} is not a marketplace program"
            )));
        };

        Ok(kind)
    }
}

/// Decodes raw account data by resolving the kind from its owner and tag.
pub fn decode_account(owner: &Pubkey, data: &[u8]) -> Result<DecodedAccount> {
    AccountKind::from_owner_and_tag(owner, data)?.decode(data)
}

fn unsupported(owner: &Pubkey, tag: u8) -> SyncError {
    SyncError::DecodeError(format!("unsupported account tag {tag} for program {owner}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetadataData;

    #[test]
    fn test_dispatch_metadata_by_owner_and_tag() {
        let meta = Metadata {
            key: MetadataKey::MetadataV1,
            update_authority: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            data: MetadataData {
                name: "a".to_string(),
                symbol: "A".to_string(),
                uri: "u".to_string(),
                seller_fee_basis_points: 0,
                creators: None,
            },
            primary_sale_happened: false,
            is_mutable: true,
        };
        let bytes = borsh::to_vec(&meta).unwrap();
        match decode_account(&ids::TOKEN_METADATA_PROGRAM, &bytes).unwrap() {
            DecodedAccount::Metadata(decoded) => assert_eq!(decoded, meta),
            other => panic!("expected metadata, got {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_rejects_unknown_owner() {
        let bytes = vec![4u8, 0, 0];
        assert!(decode_account(&Pubkey::new_unique(), &bytes).is_err());
    }

    #[test]
    fn test_dispatch_rejects_unknown_tag() {
        // StoreV1 accounts exist on chain but are not consumed here.
        let bytes = vec![MarketplaceKey::StoreV1 as u8];
        assert!(decode_account(&ids::MARKETPLACE_PROGRAM, &bytes).is_err());
    }

    #[test]
    fn test_kind_decode_rejects_other_kind_bytes() {
        let creator = WhitelistedCreator {
            key: MarketplaceKey::WhitelistedCreatorV1,
            address: Pubkey::new_unique(),
            activated: true,
        };
        let bytes = borsh::to_vec(&creator).unwrap();
        assert!(AccountKind::PayoutTicket.decode(&bytes).is_err());
        assert!(AccountKind::WhitelistedCreator.decode(&bytes).is_ok());
    }
}
