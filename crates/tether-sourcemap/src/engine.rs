//! Per-session source-map table.
//!
//! One engine per session owns the loaded consumers keyed by script id.
//! Loads happen lazily off the `scriptParsed` path and never fail the
//! session: callers log and move on.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::consumer::SourceMapConsumer;
use crate::error::SourceMapError;
use crate::fetch::SourceMapFetcher;
use crate::resolve::{resolve_reference, SourceMapReference};

/// A loaded map plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedMap {
    /// The parsed consumer.
    pub consumer: Arc<SourceMapConsumer>,
    /// The resolved external URL; `None` for inline maps.
    pub map_url: Option<String>,
}

/// Caches one consumer per script for a single session.
pub struct SourceMapEngine {
    fetcher: Arc<dyn SourceMapFetcher>,
    maps: Mutex<HashMap<String, LoadedMap>>,
}

impl SourceMapEngine {
    /// Create an empty engine over the given fetcher.
    pub fn new(fetcher: Arc<dyn SourceMapFetcher>) -> Self {
        Self {
            fetcher,
            maps: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve, fetch, parse, and cache the map for one script.
    pub async fn load(
        &self,
        script_id: &str,
        script_url: &str,
        source_map_url: &str,
    ) -> Result<(), SourceMapError> {
        let reference = resolve_reference(script_url, source_map_url)?;
        let (json, resolved_url) = match reference {
            SourceMapReference::Inline(text) => (text, None),
            SourceMapReference::External(url) => {
                let body = self.fetcher.fetch(&url).await?;
                (body, Some(url.to_string()))
            }
        };
        let consumer = SourceMapConsumer::parse(&json)?;
        self.maps.lock().await.insert(
            script_id.to_string(),
            LoadedMap {
                consumer: Arc::new(consumer),
                map_url: resolved_url,
            },
        );
        Ok(())
    }

    /// The consumer for a script, if its map loaded.
    pub async fn consumer(&self, script_id: &str) -> Option<Arc<SourceMapConsumer>> {
        self.maps
            .lock()
            .await
            .get(script_id)
            .map(|m| m.consumer.clone())
    }

    /// Whether a map is loaded for the script.
    pub async fn has_map(&self, script_id: &str) -> bool {
        self.maps.lock().await.contains_key(script_id)
    }

    /// The resolved map URL for the script, when external.
    pub async fn map_url(&self, script_id: &str) -> Option<String> {
        self.maps
            .lock()
            .await
            .get(script_id)
            .and_then(|m| m.map_url.clone())
    }

    /// How many scripts have loaded maps.
    pub async fn len(&self) -> usize {
        self.maps.lock().await.len()
    }

    /// Whether no maps are loaded.
    pub async fn is_empty(&self) -> bool {
        self.maps.lock().await.is_empty()
    }
}

impl std::fmt::Debug for SourceMapEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceMapEngine").finish_non_exhaustive()
    }
}
