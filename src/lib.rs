//! `storefront-sync` - Client-side account synchronization for a Solana NFT marketplace.
//!
//! This crate pulls on-chain program accounts over RPC, decodes their fixed
//! binary layouts into typed records, and merges them into a cross-referenced
//! in-memory cache consumed by higher-level marketplace operations (listing,
//! bidding, NFT rendering). It is explicitly a best-effort, eventually
//! consistent cache: decode failures skip single accounts, RPC failures abort
//! single branches, and the worst case is an incomplete cache surfaced as a
//! "still loading" signal — never an error reaching the UI layer.
//!
//! # Quick Start
//!
//! ```no_run
//! use storefront_sync::{StorefrontSync, SyncConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build configuration
//!     let config = SyncConfigBuilder::new()
//!         .with_rpc("https://api.mainnet-beta.solana.com")
//!         .store("11111111111111111111111111111111")
//!         .build()?;
//!
//!     // Run one full pass and read the result
//!     let sync = StorefrontSync::new(config);
//!     sync.full_sync().await?;
//!
//!     let state = sync.snapshot().await?;
//!     println!(
//!         "{} metadata records across {} index pages",
//!         state.metadata.len(),
//!         state.store_indexer.len()
//!     );
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The sync layer operates as a phase-ordered pipeline:
//!
//! 1. **`AccountFetcher`** - Filtered program scans and batched account reads
//!    (chunked at the 100-key protocol ceiling, input order preserved)
//! 2. **Decoder registry** - A fixed [`AccountKind`] enum mapping every account
//!    kind to a pure, result-returning decoder
//! 3. **`MarketState` / `StateService`** - The aggregate indexed maps, mutated
//!    only by a single owning task reached over a bounded command channel
//! 4. **`StoreIndexPager`** - Sequential discovery of on-chain index pages and
//!    the auction caches they reference
//! 5. **Pipeline executor** - Bounded-concurrency, fault-isolated fan-out for
//!    post-processing (per-creator metadata scans, edition resolution)
//! 6. **`AccountCache`** - An independent keyed fetch-through cache for wallet
//!    token accounts and mint info, with push-updated native balances
//!
//! # Consistency model
//!
//! Whitelist gating depends on fetch ordering: metadata is frequently fetched
//! before its creators are known, so a full pass fetches creators first and
//! re-evaluates the gate after metadata discovery. `metadata_by_mint` holds a
//! record iff at least one of its creators is currently whitelisted. Merges
//! are unconditional last-write-wins with no versioning.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Public API exports
pub use crate::cache::{
    AccountCache, CacheItem, CacheParser, MintInfo, NativeBalanceWatch, ParsedAccount,
    TokenAccountInfo,
};
pub use crate::config::{PipelineConfig, SyncConfig, SyncConfigBuilder};
pub use crate::core::fetcher::{AccountFetcher, MAX_MULTIPLE_ACCOUNTS};
pub use crate::core::pager::StoreIndexPager;
pub use crate::core::pipeline::{run_pipeline, PipelineReport};
pub use crate::core::registry::{decode_account, AccountKind, DecodedAccount};
pub use crate::core::service::{StateCommand, StateHandle, StateService};
pub use crate::core::state::MarketState;
pub use crate::core::sync::StorefrontSync;
pub use crate::streams::{AccountUpdate, AccountWatch};
pub use crate::types::{ids, AccountRecord};
pub use crate::utils::error::{Result, SyncError};
pub use crate::utils::rpc::{AccountFilter, DefaultRpcProvider, RpcProvider};

// Module declarations
pub mod cache;
pub mod config;
pub mod core;
pub mod streams;
pub mod types;
pub mod utils;
