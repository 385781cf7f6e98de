//! Structured Logging with Sensitive Data Redaction
//!
//! Events are emitted through `tracing`. Fields pass through redaction
//! first, so addresses, hashes and anything key-like never reach a
//! subscriber verbatim.

use tracing_subscriber::{fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stderr subscriber filtered by `RUST_LOG` (default `info`).
///
/// Meant for hosts and test binaries. Library code never calls it.
/// Returns `false` if a global subscriber was already set.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .is_ok()
}

/// Redact a value if the key suggests it's sensitive
pub fn redact_if_sensitive(key: &str, value: &str) -> String {
    let key_lower = key.to_lowercase();

    const SECRET_KEYS: [&str; 6] = ["private", "secret", "seed", "mnemonic", "password", "signature"];
    if SECRET_KEYS.iter().any(|k| key_lower.contains(k)) {
        return redact_value(value);
    }

    const ADDRESS_KEYS: [&str; 5] = ["address", "recipient", "sender", "source", "destination"];
    if key_lower == "to" || ADDRESS_KEYS.iter().any(|k| key_lower.contains(k)) {
        return redact_address(value);
    }

    const HASH_KEYS: [&str; 4] = ["txid", "tx_hash", "hash", "digest"];
    if HASH_KEYS.iter().any(|k| key_lower.contains(k)) {
        return redact_hash(value);
    }

    value.to_string()
}

/// Fully redact a sensitive value
pub fn redact_value(value: &str) -> String {
    match value.len() {
        0 => "[EMPTY]".to_string(),
        1..=4 => "[REDACTED]".to_string(),
        len => format!("[REDACTED:{}chars]", len),
    }
}

/// Partially redact an address (first 6 and last 4 chars)
pub fn redact_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 8 } else { 6 };
    let suffix_len = 4;
    if !trimmed.is_ascii() || trimmed.len() <= prefix_len + suffix_len + 3 {
        return redact_value(trimmed);
    }

    format!(
        "{}...{}",
        &trimmed[..prefix_len],
        &trimmed[trimmed.len() - suffix_len..]
    )
}

/// Partially redact a hash (first 10 and last 6 chars)
pub fn redact_hash(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.is_empty() {
        return "[EMPTY]".to_string();
    }
    if trimmed.len() <= 20 || !trimmed.is_ascii() {
        return trimmed.to_string();
    }

    let prefix_len = if trimmed.starts_with("0x") { 12 } else { 10 };
    format!("{}...{}", &trimmed[..prefix_len], &trimmed[trimmed.len() - 6..])
}

#[macro_export]
macro_rules! log_debug {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::debug!(
            module = $module,
            $($key = %$crate::utils::logging::redact_if_sensitive(
                stringify!($key),
                &::std::string::ToString::to_string(&$value),
            ),)*
            "{}",
            $msg
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::info!(
            module = $module,
            $($key = %$crate::utils::logging::redact_if_sensitive(
                stringify!($key),
                &::std::string::ToString::to_string(&$value),
            ),)*
            "{}",
            $msg
        )
    };
}

#[macro_export]
macro_rules! log_warn {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::warn!(
            module = $module,
            $($key = %$crate::utils::logging::redact_if_sensitive(
                stringify!($key),
                &::std::string::ToString::to_string(&$value),
            ),)*
            "{}",
            $msg
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::error!(
            module = $module,
            $($key = %$crate::utils::logging::redact_if_sensitive(
                stringify!($key),
                &::std::string::ToString::to_string(&$value),
            ),)*
            "{}",
            $msg
        )
    };
}
