//! Shared utility functions for provider adapters.

use wh_domain::config::AuthConfig;
use wh_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext — warn)
/// 2. `env` field (reads environment variable)
/// 3. Error
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(ref key) = auth.key {
        tracing::warn!(
            "API key loaded from plaintext config field 'key' — prefer 'env' instead"
        );
        return Ok(key.clone());
    }

    if let Some(ref env_var) = auth.env {
        return match std::env::var(env_var) {
            Ok(val) if !val.trim().is_empty() => Ok(val),
            _ => Err(Error::Auth(format!(
                "environment variable '{env_var}' not set or empty"
            ))),
        };
    }

    Err(Error::Auth(
        "no API key configured: set 'key' or 'env' in [llm.provider.auth]".into(),
    ))
}

/// Redact an API key passed as a `key=` query parameter, for safe logging.
pub(crate) fn redact_url_key(url: &str) -> String {
    match url.find("key=") {
        Some(idx) => {
            let (prefix, rest) = url.split_at(idx + 4);
            let end = rest.find('&').unwrap_or(rest.len());
            format!("{prefix}[REDACTED]{}", &rest[end..])
        }
        None => url.to_string(),
    }
}
