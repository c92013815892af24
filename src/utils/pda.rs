//! Program-derived address helpers.
//!
//! All derivations are pure; a derivation that does not match the real
//! on-chain account yields "account not found" at fetch time, never an error
//! here.

use solana_sdk::pubkey::Pubkey;

use crate::types::ids;

/// Seed prefix for token-metadata program PDAs.
pub const METADATA_PREFIX: &[u8] = b"metadata";
/// Seed prefix for marketplace program PDAs.
pub const MARKETPLACE_PREFIX: &[u8] = b"metaplex";
/// Seed used for store-indexer page PDAs, between the store and the page number.
pub const INDEX_SEED: &[u8] = b"index";
/// Seed suffix for edition PDAs.
pub const EDITION_SEED: &[u8] = b"edition";

/// Derives the metadata account address for `mint`.
#[must_use]
pub fn metadata_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            METADATA_PREFIX,
            ids::TOKEN_METADATA_PROGRAM.as_ref(),
            mint.as_ref(),
        ],
        &ids::TOKEN_METADATA_PROGRAM,
    )
    .0
}

/// Derives the edition (or master-edition) account address for `mint`.
///
/// Master editions and limited editions share this derivation; the decoded
/// tag byte distinguishes them.
#[must_use]
pub fn edition_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            METADATA_PREFIX,
            ids::TOKEN_METADATA_PROGRAM.as_ref(),
            mint.as_ref(),
            EDITION_SEED,
        ],
        &ids::TOKEN_METADATA_PROGRAM,
    )
    .0
}

/// Derives the store-indexer page address for `store` and `page`.
///
/// The page number participates as its decimal string rendering.
#[must_use]
pub fn indexer_page_address(store: &Pubkey, page: u64) -> Pubkey {
    Pubkey::find_program_address(
        &[
            MARKETPLACE_PREFIX,
            ids::MARKETPLACE_PROGRAM.as_ref(),
            store.as_ref(),
            INDEX_SEED,
            page.to_string().as_bytes(),
        ],
        &ids::MARKETPLACE_PROGRAM,
    )
    .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivations_are_deterministic() {
        let mint = Pubkey::new_unique();
        assert_eq!(metadata_address(&mint), metadata_address(&mint));
        assert_eq!(edition_address(&mint), edition_address(&mint));
    }

    #[test]
    fn test_metadata_and_edition_addresses_differ() {
        let mint = Pubkey::new_unique();
        assert_ne!(metadata_address(&mint), edition_address(&mint));
    }

    #[test]
    fn test_page_addresses_differ_by_page_number() {
        let store = Pubkey::new_unique();
        assert_ne!(
            indexer_page_address(&store, 0),
            indexer_page_address(&store, 1)
        );
        assert_eq!(
            indexer_page_address(&store, 7),
            indexer_page_address(&store, 7)
        );
    }
}
