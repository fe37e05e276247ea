//! Source-map reference resolution.
//!
//! A `scriptParsed` event carries either an inline data-URL map or a
//! URL (possibly relative to the script) pointing at an external map.

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use regex::Regex;
use url::Url;

use crate::error::SourceMapError;

static DATA_URL_RE: OnceLock<Regex> = OnceLock::new();

fn data_url_re() -> &'static Regex {
    DATA_URL_RE.get_or_init(|| {
        Regex::new(r"^data:application/json(?:;charset=[^;]+)?;base64,(.+)$")
            .expect("data-url pattern is valid")
    })
}

/// A classified source-map reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMapReference {
    /// Inline map; the decoded JSON text.
    Inline(String),
    /// External map at a fully-qualified URL.
    External(Url),
}

/// Resolve a `sourceMapURL` value against its script's URL.
///
/// Inline `data:application/json;base64,` references are decoded in
/// place; anything else is treated as a URL, joined against the script
/// URL when relative.
pub fn resolve_reference(
    script_url: &str,
    source_map_url: &str,
) -> Result<SourceMapReference, SourceMapError> {
    if let Some(caps) = data_url_re().captures(source_map_url) {
        let payload = caps
            .get(1)
            .map(|m| m.as_str())
            .unwrap_or_default();
        let bytes = BASE64_STANDARD
            .decode(payload)
            .map_err(|e| SourceMapError::Parse(format!("invalid base64 payload: {}", e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| SourceMapError::Parse("inline map is not UTF-8".into()))?;
        return Ok(SourceMapReference::Inline(text));
    }

    if let Ok(absolute) = Url::parse(source_map_url) {
        return Ok(SourceMapReference::External(absolute));
    }

    let base = Url::parse(script_url).map_err(|e| {
        SourceMapError::InvalidReference(format!("script url '{}': {}", script_url, e))
    })?;
    let joined = base.join(source_map_url).map_err(|e| {
        SourceMapError::InvalidReference(format!("'{}' against '{}': {}", source_map_url, script_url, e))
    })?;
    Ok(SourceMapReference::External(joined))
}
