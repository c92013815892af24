//! Generic keyed cache against a mock RPC endpoint.

use base64::Engine;
use serde_json::json;
use solana_program::program_option::COption;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use storefront_sync::{AccountCache, CacheItem, CacheParser, DefaultRpcProvider};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mint_account_json() -> serde_json::Value {
    let mint = spl_token::state::Mint {
        mint_authority: COption::None,
        supply: 9_000,
        decimals: 2,
        is_initialized: true,
        freeze_authority: COption::None,
    };
    let mut data = vec![0u8; spl_token::state::Mint::LEN];
    spl_token::state::Mint::pack(mint, &mut data).unwrap();

    json!({
        "lamports": 1_461_600,
        "data": [base64::engine::general_purpose::STANDARD.encode(&data), "base64"],
        "owner": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
        "executable": false,
        "rentEpoch": 0
    })
}

#[tokio::test]
async fn test_query_issues_exactly_one_rpc_for_two_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("getAccountInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": { "context": { "slot": 1 }, "value": mint_account_json() },
            "id": 1
        })))
        .mount(&mock_server)
        .await;

    let provider = DefaultRpcProvider::new(&mock_server.uri());
    let cache = AccountCache::new();
    let id = Pubkey::new_unique();

    let first = cache.query(&provider, &id, CacheParser::Mint).await.unwrap();
    let second = cache.query(&provider, &id, CacheParser::Mint).await.unwrap();

    match (&first.decoded, &second.decoded) {
        (CacheItem::Mint(a), CacheItem::Mint(b)) => {
            assert_eq!(a.supply, 9_000);
            assert_eq!(a, b);
        }
        other => panic!("expected mint entries, got {other:?}"),
    }

    let requests = mock_server.received_requests().await.unwrap();
    let info_calls = requests
        .iter()
        .filter(|req| String::from_utf8_lossy(&req.body).contains("getAccountInfo"))
        .count();
    assert_eq!(info_calls, 1, "fetch-through must memoize");
}

#[tokio::test]
async fn test_query_missing_account_is_an_error_and_not_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("getAccountInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": { "context": { "slot": 1 }, "value": null },
            "id": 1
        })))
        .mount(&mock_server)
        .await;

    let provider = DefaultRpcProvider::new(&mock_server.uri());
    let cache = AccountCache::new();
    let id = Pubkey::new_unique();

    assert!(cache.query(&provider, &id, CacheParser::Mint).await.is_err());
    assert!(cache.get(&id).is_none());
}
