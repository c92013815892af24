//! WebSocket-based account subscription for real-time updates.
//!
//! This module provides a WebSocket client that subscribes to a single
//! account's change notifications (`accountSubscribe`) and yields decoded
//! updates. It backs the generic cache's push path for the synthetic
//! native-balance record.

use std::str::FromStr;

use base64::Engine;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use tokio::time::{sleep, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::utils::error::{Result, SyncError};

/// One account-change notification, decoded from the wire.
#[derive(Debug, Clone)]
pub struct AccountUpdate {
    /// The watched account.
    pub pubkey: Pubkey,
    /// Slot the update was observed at.
    pub slot: u64,
    pub lamports: u64,
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

/// Subscribes to `accountSubscribe` notifications for one account.
///
/// Reconnects transparently after a dropped connection, waiting
/// `reconnect_delay_secs` between attempts.
pub struct AccountWatch {
    ws_url: String,
    pubkey: Pubkey,
    reconnect_delay_secs: u64,
    state: WatchState,
}

enum WatchState {
    Disconnected,
    Connected {
        #[allow(dead_code)] // Kept for future unsubscribe functionality
        subscription_id: u64,
        receiver: tokio::sync::mpsc::UnboundedReceiver<AccountUpdate>,
    },
}

/// WebSocket notification from Solana (accountSubscribe)
#[derive(Debug, Deserialize)]
struct AccountNotification {
    params: AccountNotificationParams,
}

#[derive(Debug, Deserialize)]
struct AccountNotificationParams {
    result: AccountNotificationResult,
}

#[derive(Debug, Deserialize)]
struct AccountNotificationResult {
    context: AccountNotificationContext,
    value: AccountNotificationValue,
}

#[derive(Debug, Deserialize)]
struct AccountNotificationContext {
    slot: u64,
}

#[derive(Debug, Deserialize)]
struct AccountNotificationValue {
    lamports: u64,
    /// `[payload, encoding]` pair; the payload is base64.
    data: Vec<String>,
    owner: String,
}

/// Subscription response from Solana
#[derive(Debug, Deserialize)]
struct SubscriptionResponse {
    result: u64,
}

impl AccountWatch {
    /// Creates a new watch for `pubkey` over the given WebSocket endpoint.
    #[must_use]
    pub fn new(ws_url: impl Into<String>, pubkey: Pubkey, reconnect_delay_secs: u64) -> Self {
        Self {
            ws_url: ws_url.into(),
            pubkey,
            reconnect_delay_secs,
            state: WatchState::Disconnected,
        }
    }

    /// Connects and subscribes to account notifications.
    async fn connect(&mut self) -> Result<()> {
        tracing::debug!(ws_url = %self.ws_url, account = %self.pubkey, "connecting account watch");

        let (ws_stream, _) = connect_async(&self.ws_url).await.map_err(|e| {
            SyncError::ConnectionError(format!("WebSocket connection failed: {e}"))
        })?;

        let (mut write, mut read) = ws_stream.split();

        let subscribe_request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "accountSubscribe",
            "params": [
                self.pubkey.to_string(),
                {
                    "encoding": "base64",
                    "commitment": "confirmed"
                }
            ]
        });

        write
            .send(Message::Text(subscribe_request.to_string()))
            .await
            .map_err(|e| {
                SyncError::ConnectionError(format!("Failed to send subscription: {e}"))
            })?;

        // Wait for subscription confirmation
        let subscription_id = loop {
            #[allow(clippy::collapsible_if)]
            if let Some(Ok(Message::Text(text))) = read.next().await {
                if let Ok(response) = serde_json::from_str::<SubscriptionResponse>(&text) {
                    break response.result;
                }
            }
        };

        tracing::debug!(subscription_id, "account watch subscribed");

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let pubkey = self.pubkey;

        tokio::spawn(async move {
            while let Some(Ok(Message::Text(text))) = read.next().await {
                if let Some(update) = parse_notification(pubkey, &text) {
                    if tx.send(update).is_err() {
                        break;
                    }
                }
            }
        });

        self.state = WatchState::Connected {
            subscription_id,
            receiver: rx,
        };

        Ok(())
    }

    /// Ensures the connection is established, reconnecting if necessary.
    async fn ensure_connected(&mut self) -> Result<()> {
        match &self.state {
            WatchState::Disconnected => {
                self.connect().await?;
            }
            WatchState::Connected { receiver, .. } => {
                if receiver.is_closed() {
                    tracing::warn!(account = %self.pubkey, "account watch disconnected, reconnecting");
                    sleep(Duration::from_secs(self.reconnect_delay_secs)).await;
                    self.state = WatchState::Disconnected;
                    self.connect().await?;
                }
            }
        }
        Ok(())
    }

    /// Waits for the next account update.
    pub async fn next(&mut self) -> Result<AccountUpdate> {
        self.ensure_connected().await?;

        match &mut self.state {
            WatchState::Connected { receiver, .. } => match receiver.recv().await {
                Some(update) => Ok(update),
                None => {
                    self.state = WatchState::Disconnected;
                    Err(SyncError::ConnectionError(
                        "account subscription closed".to_string(),
                    ))
                }
            },
            WatchState::Disconnected => Err(SyncError::InternalError(
                "account watch not connected".to_string(),
            )),
        }
    }
}

fn parse_notification(pubkey: Pubkey, text: &str) -> Option<AccountUpdate> {
    let notification: AccountNotification = serde_json::from_str(text).ok()?;
    let value = notification.params.result.value;
    let data = value
        .data
        .first()
        .and_then(|payload| base64::engine::general_purpose::STANDARD.decode(payload).ok())
        .unwrap_or_default();
    let owner = Pubkey::from_str(&value.owner).ok()?;

    Some(AccountUpdate {
        pubkey,
        slot: notification.params.result.context.slot,
        lamports: value.lamports,
        owner,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_starts_disconnected() {
        let watch = AccountWatch::new("ws://127.0.0.1:8900", Pubkey::new_unique(), 5);
        match watch.state {
            WatchState::Disconnected => {}
            WatchState::Connected { .. } => panic!("expected initially disconnected state"),
        }
    }

    #[test]
    fn test_account_notification_parsing() {
        let pubkey = Pubkey::new_unique();
        let json_data = r#"{
            "jsonrpc": "2.0",
            "method": "accountNotification",
            "params": {
                "result": {
                    "context": { "slot": 5208469 },
                    "value": {
                        "lamports": 33594,
                        "data": ["AQID", "base64"],
                        "owner": "11111111111111111111111111111111",
                        "executable": false,
                        "rentEpoch": 635
                    }
                },
                "subscription": 23784
            }
        }"#;

        let update = parse_notification(pubkey, json_data).unwrap();
        assert_eq!(update.slot, 5_208_469);
        assert_eq!(update.lamports, 33_594);
        assert_eq!(update.data, vec![1, 2, 3]);
        assert_eq!(update.owner, Pubkey::from_str("11111111111111111111111111111111").unwrap());
    }

    #[test]
    fn test_malformed_notification_is_ignored() {
        assert!(parse_notification(Pubkey::new_unique(), "{\"jsonrpc\":\"2.0\"}").is_none());
    }
}
