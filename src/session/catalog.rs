use crate::api::client::StatsGateway;
use crate::api::deadline::Deadline;
use crate::api::models::{HeroDto, HeroId};
use crate::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::store::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeroNames {
    internal: String,
    display: String,
}

/// Two-way mapping between hero ids and their internal/display names.
///
/// Published once into the session as an `Arc`; never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeroCatalog {
    by_internal: HashMap<String, HeroId>,
    names: HashMap<HeroId, HeroNames>,
}

impl HeroCatalog {
    pub fn new() -> Self {
        HeroCatalog::default()
    }

    pub fn from_entries(entries: &[HeroDto]) -> Self {
        let mut catalog = HeroCatalog::new();
        for hero in entries {
            catalog.insert(hero.id, hero.internal_name(), &hero.localized_name);
        }
        catalog
    }

    pub fn insert(&mut self, id: HeroId, internal: &str, display: &str) {
        if !internal.is_empty() {
            self.by_internal.insert(internal.to_string(), id);
        }
        self.names.insert(
            id,
            HeroNames {
                internal: internal.to_string(),
                display: display.to_string(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn id_for(&self, internal: &str) -> Option<HeroId> {
        self.by_internal.get(internal).copied()
    }

    pub fn resolve(&self, internal: &str) -> Result<HeroId, AppError> {
        self.id_for(internal)
            .ok_or_else(|| AppError::HeroNotFound(internal.to_string()))
    }

    pub fn display_name(&self, id: HeroId) -> Option<&str> {
        self.names
            .get(&id)
            .map(|n| n.display.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn internal_name(&self, id: HeroId) -> Option<&str> {
        self.names.get(&id).map(|n| n.internal.as_str())
    }

    /// Display name, then internal name, then the raw id while the catalog
    /// lacks the hero.
    pub fn label(&self, id: HeroId) -> String {
        match self
            .display_name(id)
            .or_else(|| self.internal_name(id).filter(|name| !name.is_empty()))
        {
            Some(name) => name.to_string(),
            None => format!("ID {}", id),
        }
    }
}

/// Fetches the hero catalog and publishes it into the session.
///
/// The gateway never retries, so this loader does: `attempts` tries spaced
/// by `backoff`, each bound to its own `timeout`.
pub async fn bootstrap_catalog(
    gateway: Arc<dyn StatsGateway>,
    store: Arc<SessionStore>,
    timeout: Duration,
    attempts: u32,
    backoff: Duration,
) -> bool {
    let attempts = attempts.max(1);
    store.begin_task("Fetching hero catalog...");

    for attempt in 1..=attempts {
        let fetch_gateway = gateway.clone();
        let fetched = tokio::task::spawn_blocking(move || {
            fetch_gateway.hero_catalog(Deadline::after(timeout))
        })
        .await;

        let failure = match fetched {
            Ok(Ok(heroes)) => {
                let catalog = HeroCatalog::from_entries(&heroes);
                if !catalog.is_empty() {
                    info!(heroes = catalog.len(), "hero catalog loaded");
                    store.mutate(|s| {
                        s.publish_catalog(Arc::new(catalog));
                        s.finish_task(Some("Ready"));
                    });
                    return true;
                }
                "empty hero list".to_string()
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("fetch task failed: {}", e),
        };

        warn!(attempt, attempts, error = %failure, "hero catalog fetch failed");
        let message = format!("Hero catalog error: {}", failure);
        store.mutate(|s| {
            s.set_status(&message);
            s.push_log(&message);
        });

        if attempt < attempts {
            tokio::time::sleep(backoff).await;
        }
    }

    store.finish_task(None);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::MatchupRecord;
    use crate::error::StatsError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn sample_entries() -> Vec<HeroDto> {
        vec![
            HeroDto {
                id: 1,
                name: "npc_dota_hero_antimage".to_string(),
                localized_name: "Anti-Mage".to_string(),
            },
            HeroDto {
                id: 14,
                name: "npc_dota_hero_pudge".to_string(),
                localized_name: "Pudge".to_string(),
            },
        ]
    }

    struct FlakyCatalog {
        failures_left: AtomicU32,
        empty: bool,
    }

    impl FlakyCatalog {
        fn failing(times: u32) -> Self {
            FlakyCatalog {
                failures_left: AtomicU32::new(times),
                empty: false,
            }
        }
    }

    impl StatsGateway for FlakyCatalog {
        fn hero_catalog(&self, _deadline: Deadline) -> Result<Vec<HeroDto>, StatsError> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(StatsError::Status {
                    code: 503,
                    url: "heroes".to_string(),
                });
            }
            if self.empty {
                return Ok(Vec::new());
            }
            Ok(sample_entries())
        }

        fn hero_matchups(
            &self,
            _hero_id: HeroId,
            _deadline: Deadline,
        ) -> Result<Vec<MatchupRecord>, StatsError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn maps_internal_names_both_ways() {
        let catalog = HeroCatalog::from_entries(&sample_entries());
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.id_for("pudge"), Some(14));
        assert_eq!(catalog.internal_name(1), Some("antimage"));
        assert_eq!(catalog.display_name(14), Some("Pudge"));
    }

    #[test]
    fn unknown_heroes_render_as_raw_ids() {
        let catalog = HeroCatalog::new();
        assert_eq!(catalog.label(42), "ID 42");
        assert!(matches!(
            catalog.resolve("invoker"),
            Err(AppError::HeroNotFound(name)) if name == "invoker"
        ));
    }

    #[test]
    fn label_falls_back_to_internal_name() {
        let mut catalog = HeroCatalog::new();
        catalog.insert(14, "pudge", "Pudge");
        catalog.insert(15, "razor", "");
        assert_eq!(catalog.label(14), "Pudge");
        assert_eq!(catalog.label(15), "razor");
        assert_eq!(catalog.label(16), "ID 16");
    }

    #[tokio::test]
    async fn bootstrap_retries_until_catalog_arrives() {
        let store = Arc::new(SessionStore::new(10));
        let gateway: Arc<dyn StatsGateway> = Arc::new(FlakyCatalog::failing(1));

        let loaded = bootstrap_catalog(
            gateway,
            store.clone(),
            Duration::from_secs(1),
            3,
            Duration::from_millis(10),
        )
        .await;

        assert!(loaded);
        let snap = store.snapshot(0);
        assert_eq!(snap.catalog.id_for("antimage"), Some(1));
        assert_eq!(snap.status, "Ready");
        assert!(!snap.loading);
        assert!(snap.logs.iter().any(|l| l.contains("503")));
    }

    #[tokio::test]
    async fn bootstrap_gives_up_after_attempts() {
        let store = Arc::new(SessionStore::new(10));
        let gateway: Arc<dyn StatsGateway> = Arc::new(FlakyCatalog::failing(5));

        let loaded = bootstrap_catalog(
            gateway,
            store.clone(),
            Duration::from_secs(1),
            2,
            Duration::from_millis(10),
        )
        .await;

        assert!(!loaded);
        let snap = store.snapshot(0);
        assert!(snap.catalog.is_empty());
        assert!(snap.status.starts_with("Hero catalog error"));
        assert!(!snap.loading);
    }

    #[tokio::test]
    async fn empty_catalog_response_is_not_published() {
        let store = Arc::new(SessionStore::new(10));
        let gateway: Arc<dyn StatsGateway> = Arc::new(FlakyCatalog {
            failures_left: AtomicU32::new(0),
            empty: true,
        });

        let loaded = bootstrap_catalog(
            gateway,
            store.clone(),
            Duration::from_secs(1),
            2,
            Duration::from_millis(10),
        )
        .await;

        assert!(!loaded);
        let snap = store.snapshot(0);
        assert!(snap.catalog.is_empty());
        assert_eq!(snap.status, "Hero catalog error: empty hero list");
        assert!(!snap.loading);
    }
}
