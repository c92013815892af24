//! Generic keyed account cache.
//!
//! An id-indexed, parser-tagged, fetch-through cache with change
//! notification, independent of the aggregate market state. Used mainly for
//! wallet token accounts and mint info: `query` memoizes `getAccountInfo`
//! lookups, `by_parser` supports bulk iteration ("all token accounts"), and a
//! wallet's native balance is kept live as a synthetic token-account-shaped
//! record via a push subscription rather than the pull path.

use std::sync::Arc;

use dashmap::DashMap;
use solana_sdk::account::Account;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::streams::AccountWatch;
use crate::types::ids;
use crate::utils::error::{Result, SyncError};
use crate::utils::rpc::RpcProvider;

/// The parsers a cache entry can be registered under.
///
/// One parser per id; the last registration wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheParser {
    TokenAccount,
    Mint,
}

/// A decoded SPL token account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccountInfo {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub is_native: bool,
}

/// A decoded SPL mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintInfo {
    pub mint_authority: Option<Pubkey>,
    pub supply: u64,
    pub decimals: u8,
    pub is_initialized: bool,
    pub freeze_authority: Option<Pubkey>,
}

/// The decoded payload of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheItem {
    Token(TokenAccountInfo),
    Mint(MintInfo),
}

impl CacheParser {
    /// Decodes raw account bytes. Pure; fails without storing anything.
    pub fn parse(self, id: &Pubkey, account: &Account) -> Result<CacheItem> {
        match self {
            CacheParser::TokenAccount => {
                let token = spl_token::state::Account::unpack(&account.data).map_err(|e| {
                    SyncError::DecodeError(format!("token account {id}: {e}"))
                })?;
                Ok(CacheItem::Token(TokenAccountInfo {
                    mint: token.mint,
                    owner: token.owner,
                    amount: token.amount,
                    is_native: token.is_native(),
                }))
            }
            CacheParser::Mint => {
                let mint = spl_token::state::Mint::unpack(&account.data)
                    .map_err(|e| SyncError::DecodeError(format!("mint {id}: {e}")))?;
                Ok(CacheItem::Mint(MintInfo {
                    mint_authority: Option::from(mint.mint_authority),
                    supply: mint.supply,
                    decimals: mint.decimals,
                    is_initialized: mint.is_initialized,
                    freeze_authority: Option::from(mint.freeze_authority),
                }))
            }
        }
    }
}

/// One cached entry: the raw account, its parser tag, and the decoded value.
#[derive(Debug, Clone)]
pub struct ParsedAccount {
    pub id: Pubkey,
    pub parser: CacheParser,
    /// Raw account info as last observed.
    pub info: Account,
    pub decoded: CacheItem,
}

/// Id-indexed fetch-through account cache.
pub struct AccountCache {
    entries: DashMap<Pubkey, ParsedAccount>,
    parsers: DashMap<Pubkey, CacheParser>,
    changes: broadcast::Sender<Pubkey>,
}

impl AccountCache {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(256);
        Self {
            entries: DashMap::new(),
            parsers: DashMap::new(),
            changes,
        }
    }

    /// Subscribes to change notifications; each stored update broadcasts its id.
    #[must_use]
    pub fn subscribe_changes(&self) -> broadcast::Receiver<Pubkey> {
        self.changes.subscribe()
    }

    /// Parses and stores `account` under `id`, firing a change notification.
    ///
    /// Registers `parser` for the id (last registration wins).
    pub fn add(&self, id: Pubkey, account: Account, parser: CacheParser) -> Result<ParsedAccount> {
        let decoded = parser.parse(&id, &account)?;
        let entry = ParsedAccount {
            id,
            parser,
            info: account,
            decoded,
        };
        self.parsers.insert(id, parser);
        self.entries.insert(id, entry.clone());
        let _ = self.changes.send(id);
        Ok(entry)
    }

    /// Returns the cached value, if any. No I/O.
    #[must_use]
    pub fn get(&self, id: &Pubkey) -> Option<ParsedAccount> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    /// Returns the cached value, or fetches, decodes and stores it
    /// (memoizing fetch-through).
    ///
    /// Two consecutive calls without an intervening invalidation issue
    /// exactly one RPC call.
    pub async fn query(
        &self,
        rpc: &dyn RpcProvider,
        id: &Pubkey,
        parser: CacheParser,
    ) -> Result<ParsedAccount> {
        if let Some(entry) = self.get(id) {
            return Ok(entry);
        }
        let account = rpc
            .get_account_info(id, None)
            .await?
            .ok_or_else(|| SyncError::RpcError(format!("Account {id} not found")))?;
        self.add(*id, account, parser)
    }

    /// All ids currently registered under `parser`, for bulk iteration.
    #[must_use]
    pub fn by_parser(&self, parser: CacheParser) -> Vec<Pubkey> {
        self.entries
            .iter()
            .filter(|entry| entry.parser == parser)
            .map(|entry| entry.id)
            .collect()
    }

    /// Registers `parser` for `id`. Idempotent; the last registration wins.
    pub fn register_parser(&self, id: Pubkey, parser: CacheParser) {
        self.parsers.insert(id, parser);
    }

    /// The parser registered for `id`, if any.
    #[must_use]
    pub fn parser_for(&self, id: &Pubkey) -> Option<CacheParser> {
        self.parsers.get(id).map(|parser| *parser.value())
    }

    /// Removes an entry without notification (explicit detach path).
    pub fn remove(&self, id: &Pubkey) {
        self.entries.remove(id);
        self.parsers.remove(id);
    }

    /// Keeps a wallet's native balance live as a synthetic
    /// token-account-shaped record, updated by an `accountSubscribe` push
    /// subscription instead of the pull-based `query` path.
    ///
    /// The record is keyed by the wallet address, carries the native mint,
    /// and mirrors the wallet's lamports as its amount. Detach the returned
    /// handle to unsubscribe and drop the record.
    #[must_use]
    pub fn watch_native_balance(
        self: &Arc<Self>,
        ws_url: impl Into<String>,
        wallet: Pubkey,
    ) -> NativeBalanceWatch {
        let cache = Arc::clone(self);
        let ws_url = ws_url.into();

        let task = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move {
                let mut watch = AccountWatch::new(ws_url, wallet, 5);
                loop {
                    match watch.next().await {
                        Ok(update) => {
                            cache.insert_native(wallet, update.lamports);
                        }
                        Err(e) => {
                            tracing::warn!(wallet = %wallet, error = %e, "native balance watch error");
                            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        }
                    }
                }
            }
        });

        NativeBalanceWatch {
            cache,
            wallet,
            task,
        }
    }

    /// Stores the synthetic native-balance record for `wallet`.
    pub(crate) fn insert_native(&self, wallet: Pubkey, lamports: u64) {
        let entry = ParsedAccount {
            id: wallet,
            parser: CacheParser::TokenAccount,
            info: Account {
                lamports,
                data: vec![],
                owner: solana_sdk::system_program::id(),
                executable: false,
                rent_epoch: 0,
            },
            decoded: CacheItem::Token(TokenAccountInfo {
                mint: ids::NATIVE_MINT,
                owner: wallet,
                amount: lamports,
                is_native: true,
            }),
        };
        self.parsers.insert(wallet, CacheParser::TokenAccount);
        self.entries.insert(wallet, entry);
        let _ = self.changes.send(wallet);
    }
}

impl Default for AccountCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a live native-balance subscription.
pub struct NativeBalanceWatch {
    cache: Arc<AccountCache>,
    wallet: Pubkey,
    task: JoinHandle<()>,
}

impl NativeBalanceWatch {
    /// The watched wallet.
    #[must_use]
    pub fn wallet(&self) -> Pubkey {
        self.wallet
    }

    /// Stops the subscription and removes the synthetic record.
    pub fn detach(self) {
        self.task.abort();
        self.cache.remove(&self.wallet);
    }
}
