use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::config::LeaguesConfig;
use crate::h2h::H2hTable;
use crate::tournament::PhaseStandings;

/// Per-league state shared between requests: the last good result and the reconciliation guard.
#[derive(Debug)]
pub struct LeagueHandle<T> {
    key: String,
    guard: Mutex<()>,
    cache: RwLock<Option<T>>,
}

impl<T: Clone> LeagueHandle<T> {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            guard: Mutex::new(()),
            cache: RwLock::new(None),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// `None` while another run holds the guard.
    pub fn try_exclusive(&self) -> Option<MutexGuard<'_, ()>> {
        self.guard.try_lock().ok()
    }

    pub async fn cached(&self) -> Option<T> {
        self.cache.read().await.clone()
    }

    pub async fn remember(&self, value: T) {
        *self.cache.write().await = Some(value);
    }
}

/// Handles for every configured league, built once at startup.
#[derive(Debug, Default)]
pub struct LeagueContext {
    tournaments: HashMap<String, Arc<LeagueHandle<PhaseStandings>>>,
    h2h: HashMap<String, Arc<LeagueHandle<H2hTable>>>,
}

impl LeagueContext {
    pub fn new(config: &LeaguesConfig) -> Self {
        let tournaments = config
            .tournaments
            .iter()
            .map(|t| (t.key.clone(), Arc::new(LeagueHandle::new(t.key.clone()))))
            .collect();
        let h2h = config
            .h2h
            .iter()
            .map(|l| (l.key.clone(), Arc::new(LeagueHandle::new(l.key.clone()))))
            .collect();

        Self { tournaments, h2h }
    }

    pub fn tournament(&self, key: &str) -> Option<Arc<LeagueHandle<PhaseStandings>>> {
        self.tournaments.get(key).cloned()
    }

    pub fn h2h(&self, key: &str) -> Option<Arc<LeagueHandle<H2hTable>>> {
        self.h2h.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_is_exclusive() {
        let handle: LeagueHandle<u32> = LeagueHandle::new("office");

        let first = handle.try_exclusive();
        assert!(first.is_some());
        assert!(handle.try_exclusive().is_none());

        drop(first);
        assert!(handle.try_exclusive().is_some());
    }

    #[tokio::test]
    async fn test_cache_keeps_last_value() {
        let handle: LeagueHandle<u32> = LeagueHandle::new("office");
        assert_eq!(handle.cached().await, None);

        handle.remember(7).await;
        handle.remember(9).await;

        assert_eq!(handle.cached().await, Some(9));
    }

    #[test]
    fn test_context_has_one_handle_per_league() {
        let config = LeaguesConfig::from_json_str(
            r#"{"tournaments": [{"key": "cup", "league_id": 1}], "h2h": [{"key": "office", "h2h_league_id": 2}]}"#,
        )
        .unwrap();
        let context = LeagueContext::new(&config);

        assert!(context.tournament("cup").is_some());
        assert!(context.h2h("office").is_some());
        assert!(context.h2h("cup").is_none());
    }
}
