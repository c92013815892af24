//! Store-indexer page discovery behaviour.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use solana_sdk::account::Account;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;

use storefront_sync::types::marketplace::{MarketplaceKey, StoreIndexer};
use storefront_sync::utils::pda;
use storefront_sync::{
    ids, AccountFetcher, AccountFilter, Result, RpcProvider, StateService, StoreIndexPager,
};

#[derive(Default)]
struct PageProvider {
    accounts: Mutex<HashMap<Pubkey, Account>>,
}

impl PageProvider {
    fn add_page(&self, store: &Pubkey, page: u64) {
        let indexer = StoreIndexer {
            key: MarketplaceKey::StoreIndexerV1,
            store: *store,
            page,
            auction_caches: vec![],
        };
        self.accounts.lock().unwrap().insert(
            pda::indexer_page_address(store, page),
            Account {
                lamports: 1,
                data: borsh::to_vec(&indexer).unwrap(),
                owner: ids::MARKETPLACE_PROGRAM,
                executable: false,
                rent_epoch: 0,
            },
        );
    }
}

#[async_trait]
impl RpcProvider for PageProvider {
    async fn get_program_accounts(
        &self,
        _: &Pubkey,
        _: &[AccountFilter],
        _: Option<CommitmentConfig>,
    ) -> Result<Vec<(Pubkey, Account)>> {
        Ok(vec![])
    }

    async fn get_multiple_accounts(
        &self,
        pubkeys: &[Pubkey],
        _: Option<CommitmentConfig>,
    ) -> Result<Vec<Option<Account>>> {
        let accounts = self.accounts.lock().unwrap();
        Ok(pubkeys.iter().map(|pk| accounts.get(pk).cloned()).collect())
    }

    async fn get_account_info(
        &self,
        pubkey: &Pubkey,
        _: Option<CommitmentConfig>,
    ) -> Result<Option<Account>> {
        Ok(self.accounts.lock().unwrap().get(pubkey).cloned())
    }
}

fn pager_for(provider: Arc<PageProvider>, store: Pubkey) -> StoreIndexPager {
    let fetcher = Arc::new(AccountFetcher::with_provider(
        provider,
        CommitmentConfig::confirmed(),
    ));
    StoreIndexPager::new(fetcher, StateService::spawn(64), store)
}

#[tokio::test]
async fn test_pull_pages_returns_exactly_k_contiguous_pages() {
    let provider = Arc::new(PageProvider::default());
    let store = Pubkey::new_unique();
    for page in 0..4 {
        provider.add_page(&store, page);
    }

    let pager = pager_for(provider, store);
    let pages = pager.pull_pages().await.unwrap();

    assert_eq!(pages.len(), 4);
    let numbers: Vec<u64> = pages.iter().map(|record| record.decoded.page).collect();
    assert_eq!(numbers, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_pull_pages_empty_store() {
    let provider = Arc::new(PageProvider::default());
    let pager = pager_for(provider, Pubkey::new_unique());
    assert!(pager.pull_pages().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_gap_silently_truncates_later_pages() {
    let provider = Arc::new(PageProvider::default());
    let store = Pubkey::new_unique();
    provider.add_page(&store, 0);
    provider.add_page(&store, 1);
    // no page 2
    provider.add_page(&store, 3);

    let pager = pager_for(provider, store);
    let pages = pager.pull_pages().await.unwrap();

    assert_eq!(pages.len(), 2, "walk must stop at the first missing page");
}

#[tokio::test]
async fn test_pull_single_missing_page_is_none() {
    let provider = Arc::new(PageProvider::default());
    let pager = pager_for(provider, Pubkey::new_unique());
    assert!(pager.pull_page(9).await.unwrap().is_none());
}

#[tokio::test]
async fn test_page_address_is_pure_and_deterministic() {
    let provider = Arc::new(PageProvider::default());
    let store = Pubkey::new_unique();
    let pager = pager_for(provider, store);
    assert_eq!(pager.page_address(5), pda::indexer_page_address(&store, 5));
}
