//! Push-based input sources (WebSocket subscriptions).

pub mod account_watch;

pub use account_watch::{AccountUpdate, AccountWatch};
