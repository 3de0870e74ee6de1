//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::auth::SessionManager;
use crate::config::ServerConfig;
use kasir_core::cache::ReportCache;
use kasir_db::Database;

/// Handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,

    /// Serialized report responses keyed by query shape.
    pub cache: Arc<ReportCache<Value>>,

    pub sessions: Arc<SessionManager>,

    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let cache = ReportCache::new(config.cache_capacity, config.cache_ttl());
        let sessions = SessionManager::new(
            &config.session_secret,
            config.session_ttl_secs,
            config.cookie_secure,
        );

        AppState {
            db,
            cache: Arc::new(cache),
            sessions: Arc::new(sessions),
            config: Arc::new(config),
        }
    }

    /// Drops every cached report. Called after any write that can change
    /// report figures.
    pub fn invalidate_reports(&self) {
        let dropped = self.cache.len();
        self.cache.clear();
        if dropped > 0 {
            debug!(dropped, "Report cache cleared");
        }
    }
}

/// Periodically removes expired cache entries until aborted.
pub fn spawn_cache_sweeper(cache: Arc<ReportCache<Value>>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.sweep();
            if removed > 0 {
                debug!(removed, remaining = cache.len(), "Swept expired report cache entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kasir_db::DbConfig;

    #[tokio::test]
    async fn test_invalidate_reports_clears_cache() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = AppState::new(db, ServerConfig::for_tests());

        state.cache.set("sales:x", Value::Null);
        assert_eq!(state.cache.len(), 1);

        state.invalidate_reports();
        assert!(state.cache.is_empty());
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_entries() {
        let cache = Arc::new(ReportCache::new(10, Duration::from_millis(20)));
        cache.set("sales:x", Value::Null);

        let handle = spawn_cache_sweeper(cache.clone(), Duration::from_millis(30));
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();

        assert!(cache.is_empty());
    }
}
