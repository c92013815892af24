//! Decoded account record wrapper.

use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;

/// A decoded on-chain account together with its address and raw form.
///
/// A record is owned exclusively by whichever index map holds it; maps hand
/// out clones, never shared mutable references.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord<T> {
    /// The account's address.
    pub address: Pubkey,
    /// The raw account as returned by RPC (lamports, owner, data bytes).
    pub account: Account,
    /// The decoded record.
    pub decoded: T,
}

impl<T> AccountRecord<T> {
    /// Wraps a decoded value with its source account.
    #[must_use]
    pub fn new(address: Pubkey, account: Account, decoded: T) -> Self {
        Self {
            address,
            account,
            decoded,
        }
    }

    /// The raw account data bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.account.data
    }
}
