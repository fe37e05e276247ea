//! Target URL admission policy.
//!
//! Only `ws://`/`wss://` URLs whose host appears on the configured
//! allow-list may be connected. The default list covers loopback;
//! remote hosts must be allowed explicitly in configuration.

use url::Url;

use crate::error::BrokerError;

/// Validate a target URL against the admission policy.
///
/// Host comparison is exact and case-insensitive; IPv6 hosts are
/// compared without brackets, so `::1` in the allow-list matches
/// `ws://[::1]:9229`.
pub fn validate_target_url(raw: &str, allowed_hosts: &[String]) -> Result<Url, BrokerError> {
    let url = Url::parse(raw)
        .map_err(|e| BrokerError::InvalidParameters(format!("malformed url '{}': {}", raw, e)))?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(BrokerError::InvalidParameters(format!(
                "unsupported scheme '{}': only ws:// and wss:// targets are accepted",
                other
            )))
        }
    }

    let host = url
        .host_str()
        .ok_or_else(|| BrokerError::InvalidParameters(format!("url '{}' has no host", raw)))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');

    let allowed = allowed_hosts
        .iter()
        .any(|h| h.eq_ignore_ascii_case(host));
    if !allowed {
        return Err(BrokerError::InvalidParameters(format!(
            "host '{}' is not in the allowed host list",
            host
        )));
    }

    Ok(url)
}
