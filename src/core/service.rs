//! The state service: a single owning task that serializes all mutation of
//! the aggregate [`MarketState`].
//!
//! There are no locks around the state; correctness rests on every mutation
//! flowing through one bounded command channel, processed in arrival order by
//! one task. Readers request immutable snapshots and never observe a
//! half-applied batch.

use std::sync::Arc;

use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::{mpsc, oneshot};

use crate::core::registry::DecodedAccount;
use crate::core::state::MarketState;
use crate::types::{AccountRecord, Metadata};
use crate::utils::error::{Result, SyncError};

/// Commands accepted by the state service.
pub enum StateCommand {
    /// Upsert one decoded record.
    Merge {
        address: Pubkey,
        account: Account,
        decoded: DecodedAccount,
    },
    /// Upsert a batch of decoded records in order, atomically with respect to
    /// snapshots.
    MergeBatch {
        entries: Vec<(Pubkey, Account, DecodedAccount)>,
    },
    /// Store the per-auction metadata listing from an auction cache.
    SetAuctionMetadata {
        auction: Pubkey,
        records: Vec<AccountRecord<Metadata>>,
    },
    /// Cross-link a resolved master edition to its metadata.
    LinkMasterEdition { master_edition: Pubkey, mint: Pubkey },
    /// Re-check every metadata record against the current whitelist.
    ReevaluateGate,
    /// Remove duplicate addresses from the flat metadata list.
    DedupMetadata,
    /// Reply with an immutable snapshot of the current state.
    Snapshot {
        reply: oneshot::Sender<Arc<MarketState>>,
    },
}

/// Spawns the owning task and returns the handle used to reach it.
pub struct StateService;

impl StateService {
    /// Spawns the service with a bounded command channel of `capacity`.
    ///
    /// The task runs until every [`StateHandle`] clone is dropped.
    #[must_use]
    pub fn spawn(capacity: usize) -> StateHandle {
        let (tx, mut rx) = mpsc::channel::<StateCommand>(capacity);

        tokio::spawn(async move {
            let mut state = MarketState::default();
            while let Some(command) = rx.recv().await {
                match command {
                    StateCommand::Merge {
                        address,
                        account,
                        decoded,
                    } => state.merge(address, account, decoded),
                    StateCommand::MergeBatch { entries } => {
                        for (address, account, decoded) in entries {
                            state.merge(address, account, decoded);
                        }
                    }
                    StateCommand::SetAuctionMetadata { auction, records } => {
                        state.set_auction_metadata(auction, records);
                    }
                    StateCommand::LinkMasterEdition {
                        master_edition,
                        mint,
                    } => state.link_master_edition(master_edition, mint),
                    StateCommand::ReevaluateGate => state.reevaluate_metadata_gate(),
                    StateCommand::DedupMetadata => state.dedup_metadata(),
                    StateCommand::Snapshot { reply } => {
                        let _ = reply.send(Arc::new(state.clone()));
                    }
                }
            }
            tracing::debug!("state service stopped");
        });

        StateHandle { tx }
    }
}

/// Cloneable handle to the state service.
///
/// Sends suspend when the command channel is full (backpressure); every
/// method fails with `InternalError` once the service task has stopped.
#[derive(Clone)]
pub struct StateHandle {
    tx: mpsc::Sender<StateCommand>,
}

impl StateHandle {
    async fn send(&self, command: StateCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| SyncError::InternalError("state service stopped".to_string()))
    }

    /// Upserts one decoded record.
    pub async fn merge(
        &self,
        address: Pubkey,
        account: Account,
        decoded: DecodedAccount,
    ) -> Result<()> {
        self.send(StateCommand::Merge {
            address,
            account,
            decoded,
        })
        .await
    }

    /// Upserts a batch of decoded records in order.
    pub async fn merge_batch(
        &self,
        entries: Vec<(Pubkey, Account, DecodedAccount)>,
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.send(StateCommand::MergeBatch { entries }).await
    }

    /// Stores the per-auction metadata listing from an auction cache.
    pub async fn set_auction_metadata(
        &self,
        auction: Pubkey,
        records: Vec<AccountRecord<Metadata>>,
    ) -> Result<()> {
        self.send(StateCommand::SetAuctionMetadata { auction, records })
            .await
    }

    /// Cross-links a resolved master edition to the metadata of `mint`.
    pub async fn link_master_edition(&self, master_edition: Pubkey, mint: Pubkey) -> Result<()> {
        self.send(StateCommand::LinkMasterEdition {
            master_edition,
            mint,
        })
        .await
    }

    /// Re-checks every metadata record against the current whitelist.
    pub async fn reevaluate_gate(&self) -> Result<()> {
        self.send(StateCommand::ReevaluateGate).await
    }

    /// Removes duplicate addresses from the flat metadata list.
    pub async fn dedup_metadata(&self) -> Result<()> {
        self.send(StateCommand::DedupMetadata).await
    }

    /// Returns an immutable snapshot reflecting every command sent before
    /// this call from the same caller.
    pub async fn snapshot(&self) -> Result<Arc<MarketState>> {
        let (reply, rx) = oneshot::channel();
        self.send(StateCommand::Snapshot { reply }).await?;
        rx.await
            .map_err(|_| SyncError::InternalError("state service stopped".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketplaceKey, WhitelistedCreator};

    fn empty_account() -> Account {
        Account {
            lamports: 1,
            data: vec![],
            owner: Pubkey::default(),
            executable: false,
            rent_epoch: 0,
        }
    }

    #[tokio::test]
    async fn test_merge_then_snapshot_observes_write() {
        let handle = StateService::spawn(16);
        let creator = Pubkey::new_unique();
        handle
            .merge(
                Pubkey::new_unique(),
                empty_account(),
                DecodedAccount::WhitelistedCreator(WhitelistedCreator {
                    key: MarketplaceKey::WhitelistedCreatorV1,
                    address: creator,
                    activated: true,
                }),
            )
            .await
            .unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.whitelisted_creators_by_creator.contains_key(&creator));
    }

    #[tokio::test]
    async fn test_snapshot_is_immutable() {
        let handle = StateService::spawn(16);
        let before = handle.snapshot().await.unwrap();
        handle
            .merge(
                Pubkey::new_unique(),
                empty_account(),
                DecodedAccount::WhitelistedCreator(WhitelistedCreator {
                    key: MarketplaceKey::WhitelistedCreatorV1,
                    address: Pubkey::new_unique(),
                    activated: true,
                }),
            )
            .await
            .unwrap();
        let after = handle.snapshot().await.unwrap();

        assert!(before.whitelisted_creators_by_creator.is_empty());
        assert_eq!(after.whitelisted_creators_by_creator.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_noop() {
        let handle = StateService::spawn(16);
        handle.merge_batch(vec![]).await.unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.metadata.is_empty());
    }
}
