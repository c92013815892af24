//! Logging utilities (thin wrappers for tracing)

/// Initializes a `tracing` subscriber with env-filter support.
///
/// Respects `RUST_LOG`; defaults to `info` for this crate. Safe to call more
/// than once — subsequent calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("storefront_sync=info")),
        )
        .try_init();
}

/// Logs sync startup information.
pub fn log_startup(store: &str, rpc_url: &str) {
    if std::env::var("STOREFRONT_SYNC_SILENT").is_ok() {
        return;
    }

    // Sanitize RPC URL
    let sanitized_url = if rpc_url.contains("api-key=") {
        if let Some(pos) = rpc_url.find("api-key=") {
            let before = &rpc_url[..pos + 8];
            let after = &rpc_url[pos + 8..];
            let end_pos = after.find('&').unwrap_or(after.len());
            format!("{}[REDACTED]{}", before, &after[end_pos..])
        } else {
            rpc_url.to_string()
        }
    } else {
        rpc_url.to_string()
    };

    tracing::info!(
        store = store,
        rpc_url = sanitized_url,
        "Storefront sync startup"
    );
}

/// Logs a batch merge summary.
pub fn log_batch(merged: usize, fetched: usize, duration_ms: u64) {
    if std::env::var("STOREFRONT_SYNC_SILENT").is_ok() {
        return;
    }
    if fetched > 0 {
        tracing::info!(
            merged = merged,
            fetched = fetched,
            duration_ms = duration_ms,
            "Batch merged"
        );
    }
}

/// Logs an error with context.
pub fn log_error(context: &str, error: &str) {
    tracing::error!(context = context, error = error, "Sync error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_does_not_panic_on_api_key_url() {
        log_startup(
            "9y9y9y9y9y9y9y9y9y9y9y9y9y9y9y9y9y9y9y9y9y9",
            "https://mainnet.helius-rpc.com/?api-key=secret&foo=bar",
        );
    }
}
