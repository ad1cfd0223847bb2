//! Backend connection configuration.
//!
//! Terminals are provisioned either with explicit settings or with a packed
//! connection string issued by the admin side: base64url-encoded JSON
//! carrying the backend `url`, API `key`, and terminal id (`tid`), pasted
//! once during setup.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde_json::Value;

/// Normalise a backend base URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
/// - strip a trailing `/api` segment
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

fn decode_connection_string_payload(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str::<Value>(trimmed).ok();
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.starts_with('{') {
        return serde_json::from_str::<Value>(&compact).ok();
    }
    if compact.len() < 20 {
        return None;
    }

    let base64 = compact.replace('-', "+").replace('_', "/");
    let padded = format!(
        "{}{}",
        base64,
        "=".repeat((4usize.wrapping_sub(base64.len() % 4)) % 4)
    );
    let decoded = BASE64_STANDARD.decode(padded).ok()?;
    serde_json::from_slice::<Value>(&decoded).ok()
}

fn string_field(payload: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(value) = payload
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return Some(value.to_string());
        }
    }
    None
}

/// Pull the bare API key out of a packed connection string.
pub fn extract_api_key_from_connection_string(raw: &str) -> Option<String> {
    decode_connection_string_payload(raw).and_then(|v| string_field(&v, &["key"]))
}

/// Pull the normalised backend URL out of a packed connection string.
pub fn extract_base_url_from_connection_string(raw: &str) -> Option<String> {
    decode_connection_string_payload(raw)
        .and_then(|v| string_field(&v, &["url"]))
        .map(|url| normalize_base_url(&url))
}

/// Pull the terminal id out of a packed connection string.
pub fn extract_terminal_id_from_connection_string(raw: &str) -> Option<String> {
    decode_connection_string_payload(raw).and_then(|v| string_field(&v, &["tid", "terminalId"]))
}

/// Resolved connection settings for one backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: String,
    pub terminal_id: Option<String>,
}

impl BackendConfig {
    /// Build from explicit settings. The API key may itself be a packed
    /// connection string; the bare key is extracted in that case.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let resolved_key =
            extract_api_key_from_connection_string(api_key).unwrap_or_else(|| api_key.to_string());
        let terminal_id = extract_terminal_id_from_connection_string(api_key);
        Self {
            base_url: normalize_base_url(base_url),
            api_key: resolved_key,
            terminal_id,
        }
    }

    /// Build from a packed connection string alone; `None` when the string
    /// does not decode to a payload carrying both `url` and `key`.
    pub fn from_connection_string(raw: &str) -> Option<Self> {
        let base_url = extract_base_url_from_connection_string(raw)?;
        let api_key = extract_api_key_from_connection_string(raw)?;
        Some(Self {
            base_url,
            api_key,
            terminal_id: extract_terminal_id_from_connection_string(raw),
        })
    }

    pub fn with_terminal_id(mut self, terminal_id: &str) -> Self {
        self.terminal_id = Some(terminal_id.trim().to_string());
        self
    }
}
