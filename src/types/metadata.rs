//! Token-metadata program layouts: metadata, editions, master editions.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use super::{trim_nul, try_from_slice_checked};
use crate::utils::error::Result;

/// Fixed capacity the on-chain program allocates for a metadata name.
pub const MAX_NAME_LENGTH: usize = 32;
/// Fixed capacity for a metadata symbol.
pub const MAX_SYMBOL_LENGTH: usize = 10;
/// Fixed capacity for a metadata URI.
pub const MAX_URI_LENGTH: usize = 200;
/// Maximum number of creators a metadata record may carry.
pub const MAX_CREATOR_LIMIT: usize = 5;

/// Account tag bytes for the token-metadata program.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum MetadataKey {
    Uninitialized = 0,
    EditionV1 = 1,
    MasterEditionV1 = 2,
    MetadataV1 = 4,
    MasterEditionV2 = 6,
}

/// A royalty creator claim on a metadata record.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    pub address: Pubkey,
    /// Whether the creator has signed the metadata. Unverified claims do not
    /// open the whitelist gate.
    pub verified: bool,
    /// Royalty share in percent.
    pub share: u8,
}

/// The variable-length payload of a metadata record.
///
/// The on-chain program pads `name`, `symbol` and `uri` with NULs up to their
/// fixed capacities; use the trimming accessors on [`Metadata`] for display.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MetadataData {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Option<Vec<Creator>>,
}

/// An NFT metadata account.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub key: MetadataKey,
    pub update_authority: Pubkey,
    pub mint: Pubkey,
    pub data: MetadataData,
    pub primary_sale_happened: bool,
    pub is_mutable: bool,
}

impl Metadata {
    /// Decodes a metadata account from raw bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, MetadataKey::MetadataV1 as u8)
    }

    /// The display name with NUL padding stripped.
    #[must_use]
    pub fn name(&self) -> &str {
        trim_nul(&self.data.name)
    }

    /// The symbol with NUL padding stripped.
    #[must_use]
    pub fn symbol(&self) -> &str {
        trim_nul(&self.data.symbol)
    }

    /// The URI with NUL padding stripped.
    #[must_use]
    pub fn uri(&self) -> &str {
        trim_nul(&self.data.uri)
    }

    /// Byte offset of the creator at `slot` within the serialized account,
    /// for memcmp-filtered program scans.
    ///
    /// Valid for accounts written with fixed-capacity string padding, which
    /// is how the on-chain program always writes them.
    #[must_use]
    pub fn creator_offset(slot: usize) -> usize {
        1 + 32 // key + update authority
            + 32 // mint
            + 4 + MAX_NAME_LENGTH
            + 4 + MAX_SYMBOL_LENGTH
            + 4 + MAX_URI_LENGTH
            + 2 // seller fee
            + 1 // creators Option tag
            + 4 // creators Vec length
            + slot * (32 + 1 + 1)
    }
}

/// A limited-edition print pointing back at its master edition.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Edition {
    pub key: MetadataKey,
    /// The master edition this print was struck from.
    pub parent: Pubkey,
    /// This print's edition number.
    pub edition: u64,
}

impl Edition {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, MetadataKey::EditionV1 as u8)
    }
}

/// Deprecated printing-token master edition.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MasterEditionV1 {
    pub key: MetadataKey,
    pub supply: u64,
    pub max_supply: Option<u64>,
    pub printing_mint: Pubkey,
    pub one_time_printing_authorization_mint: Pubkey,
}

impl MasterEditionV1 {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, MetadataKey::MasterEditionV1 as u8)
    }
}

/// Current-generation master edition.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct MasterEditionV2 {
    pub key: MetadataKey,
    pub supply: u64,
    pub max_supply: Option<u64>,
}

impl MasterEditionV2 {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, MetadataKey::MasterEditionV2 as u8)
    }
}

/// Either generation of master edition, unified for indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterEdition {
    V1(MasterEditionV1),
    V2(MasterEditionV2),
}

impl MasterEdition {
    /// Number of prints struck so far.
    #[must_use]
    pub fn supply(&self) -> u64 {
        match self {
            MasterEdition::V1(me) => me.supply,
            MasterEdition::V2(me) => me.supply,
        }
    }

    /// Print ceiling, if capped.
    #[must_use]
    pub fn max_supply(&self) -> Option<u64> {
        match self {
            MasterEdition::V1(me) => me.max_supply,
            MasterEdition::V2(me) => me.max_supply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::SyncError;

    fn sample_metadata() -> Metadata {
        Metadata {
            key: MetadataKey::MetadataV1,
            update_authority: Pubkey::new_unique(),
            mint: Pubkey::new_unique(),
            data: MetadataData {
                name: format!("Solarium #1{}", "\0".repeat(20)),
                symbol: "SOLR\0\0".to_string(),
                uri: "https://arweave.net/abc".to_string(),
                seller_fee_basis_points: 500,
                creators: Some(vec![Creator {
                    address: Pubkey::new_unique(),
                    verified: true,
                    share: 100,
                }]),
            },
            primary_sale_happened: false,
            is_mutable: true,
        }
    }

    #[test]
    fn test_metadata_roundtrip() {
        let meta = sample_metadata();
        let bytes = borsh::to_vec(&meta).unwrap();
        let decoded = Metadata::decode(&bytes).unwrap();
        assert_eq!(decoded, meta);
        assert_eq!(decoded.name(), "Solarium #1");
        assert_eq!(decoded.symbol(), "SOLR");
    }

    #[test]
    fn test_metadata_tolerates_trailing_padding() {
        let meta = sample_metadata();
        let mut bytes = borsh::to_vec(&meta).unwrap();
        bytes.extend_from_slice(&[0u8; 64]);
        assert_eq!(Metadata::decode(&bytes).unwrap(), meta);
    }

    #[test]
    fn test_metadata_rejects_wrong_tag() {
        let meta = sample_metadata();
        let mut bytes = borsh::to_vec(&meta).unwrap();
        bytes[0] = MetadataKey::MasterEditionV2 as u8;
        match Metadata::decode(&bytes) {
            Err(SyncError::DecodeError(_)) => {}
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_metadata_rejects_truncated_input() {
        let meta = sample_metadata();
        let bytes = borsh::to_vec(&meta).unwrap();
        assert!(Metadata::decode(&bytes[..40]).is_err());
    }

    #[test]
    fn test_master_edition_v2_roundtrip() {
        let me = MasterEditionV2 {
            key: MetadataKey::MasterEditionV2,
            supply: 3,
            max_supply: Some(10),
        };
        let bytes = borsh::to_vec(&me).unwrap();
        assert_eq!(MasterEditionV2::decode(&bytes).unwrap(), me);
    }

    #[test]
    fn test_creator_offset_is_stable() {
        // key(1) + authority(32) + mint(32) + name(4+32) + symbol(4+10)
        // + uri(4+200) + fee(2) + option(1) + vec len(4) = 326
        assert_eq!(Metadata::creator_offset(0), 326);
        assert_eq!(Metadata::creator_offset(1), 326 + 34);
    }
}
