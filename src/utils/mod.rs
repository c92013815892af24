//! Shared utilities: errors, logging, RPC seam, PDA derivation.

pub mod error;
pub mod logging;
pub mod pda;
pub mod rpc;
