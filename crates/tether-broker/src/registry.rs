//! Session registry: id issuance, admission, capacity, lifecycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use tether_sourcemap::SourceMapFetcher;

use crate::error::BrokerError;
use crate::events::SessionEvent;
use crate::policy::validate_target_url;
use crate::session::{DebugSession, SessionSeed};

/// Capacity of the session notification channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Registry limits and admission settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of concurrently tracked sessions.
    pub max_sessions: usize,
    /// Per-command response deadline.
    pub command_timeout: Duration,
    /// WebSocket connect deadline.
    pub connect_timeout: Duration,
    /// Hosts a target URL may point at.
    pub allowed_hosts: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_sessions: 16,
            command_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            allowed_hosts: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "::1".to_string(),
            ],
        }
    }
}

/// Owns every live session, keyed by external id.
///
/// Lookup, create, and destroy are safe for concurrent callers. A
/// reaper task removes sessions whose transport has closed, so
/// commands against them fail `SESSION_NOT_FOUND` afterwards.
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Arc<DebugSession>>>>,
    config: RegistryConfig,
    fetcher: Arc<dyn SourceMapFetcher>,
    events: broadcast::Sender<SessionEvent>,
    reap_tx: mpsc::UnboundedSender<String>,
}

impl SessionRegistry {
    /// Create a registry and spawn its reaper task. Must be called
    /// from within a tokio runtime.
    pub fn new(config: RegistryConfig, fetcher: Arc<dyn SourceMapFetcher>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (reap_tx, mut reap_rx) = mpsc::unbounded_channel::<String>();
        let sessions: Arc<RwLock<HashMap<String, Arc<DebugSession>>>> =
            Arc::new(RwLock::new(HashMap::new()));

        let reaper_map = Arc::downgrade(&sessions);
        tokio::spawn(async move {
            while let Some(id) = reap_rx.recv().await {
                let Some(map) = reaper_map.upgrade() else { break };
                if map.write().await.remove(&id).is_some() {
                    tracing::debug!(session = %id, "reaped disconnected session");
                }
            }
        });

        Self {
            sessions,
            config,
            fetcher,
            events,
            reap_tx,
        }
    }

    /// Connect a new session to `url`, enforcing the admission policy
    /// and the session cap. Returns the installed session.
    pub async fn create(
        &self,
        url: &str,
        name: Option<String>,
    ) -> Result<Arc<DebugSession>, BrokerError> {
        let url = validate_target_url(url, &self.config.allowed_hosts)?;

        if self.sessions.read().await.len() >= self.config.max_sessions {
            return Err(BrokerError::MaxSessionsReached(self.config.max_sessions));
        }

        let id = Uuid::new_v4().to_string();
        let session = DebugSession::connect(SessionSeed {
            id: id.clone(),
            name,
            url,
            command_timeout: self.config.command_timeout,
            connect_timeout: self.config.connect_timeout,
            events: self.events.clone(),
            reap: self.reap_tx.clone(),
            fetcher: self.fetcher.clone(),
        })
        .await?;

        let mut map = self.sessions.write().await;
        // Concurrent creates can race past the early check.
        if map.len() >= self.config.max_sessions {
            drop(map);
            session.disconnect().await;
            return Err(BrokerError::MaxSessionsReached(self.config.max_sessions));
        }
        map.insert(id, session.clone());
        Ok(session)
    }

    /// Look up a session by id.
    pub async fn get(&self, id: &str) -> Result<Arc<DebugSession>, BrokerError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| BrokerError::SessionNotFound(id.to_string()))
    }

    /// Remove a session from the registry, returning it for teardown.
    pub async fn remove(&self, id: &str) -> Result<Arc<DebugSession>, BrokerError> {
        self.sessions
            .write()
            .await
            .remove(id)
            .ok_or_else(|| BrokerError::SessionNotFound(id.to_string()))
    }

    /// All tracked sessions, oldest first.
    pub async fn list(&self) -> Vec<Arc<DebugSession>> {
        let mut sessions: Vec<Arc<DebugSession>> =
            self.sessions.read().await.values().cloned().collect();
        sessions.sort_by_key(|s| s.created_at());
        sessions
    }

    /// Subscribe to session notifications across all sessions.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Number of tracked sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are tracked.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("max_sessions", &self.config.max_sessions)
            .finish_non_exhaustive()
    }
}
