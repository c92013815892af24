//! Token-vault program layouts.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use super::try_from_slice_checked;
use crate::utils::error::Result;

/// Account tag bytes for the vault program.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum VaultKey {
    Uninitialized = 0,
    SafetyDepositBoxV1 = 1,
    ExternalPriceAccountV1 = 2,
    VaultV1 = 3,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    Inactive,
    Active,
    Combined,
    Deactivated,
}

/// A token vault holding the safety deposit boxes auctioned off by a store.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Vault {
    pub key: VaultKey,
    pub token_program: Pubkey,
    pub fraction_mint: Pubkey,
    pub authority: Pubkey,
    pub fraction_treasury: Pubkey,
    pub redeem_treasury: Pubkey,
    pub allow_further_share_creation: bool,
    pub pricing_lookup_address: Pubkey,
    pub token_type_count: u8,
    pub state: VaultState,
    pub locked_price_per_share: u64,
}

impl Vault {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, VaultKey::VaultV1 as u8)
    }
}

/// One deposited token type inside a vault, addressed by `(vault, order)`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct SafetyDepositBox {
    pub key: VaultKey,
    /// The vault this box belongs to.
    pub vault: Pubkey,
    /// Mint of the deposited token.
    pub token_mint: Pubkey,
    /// Token account holding the deposit.
    pub store: Pubkey,
    /// Position of this box within the vault.
    pub order: u8,
}

impl SafetyDepositBox {
    pub fn decode(data: &[u8]) -> Result<Self> {
        try_from_slice_checked(data, VaultKey::SafetyDepositBoxV1 as u8)
    }
}
