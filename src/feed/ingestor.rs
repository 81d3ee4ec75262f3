use crate::api::models::HeroId;
use crate::session::store::{RosterAddition, SessionStore};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::patterns::HeroRevealMatcher;
use super::payload::FeedPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    /// The push feed reports a different local hero than before.
    LocalHeroChanged(HeroId),
    /// A log line revealed a hero not yet on the enemy roster.
    EnemyHeroDetected(HeroId),
}

/// Turns push-feed payloads and console-log lines into session updates and
/// pick events. Never fails: input it cannot use is dropped or logged.
pub struct FeedIngestor {
    store: Arc<SessionStore>,
    matcher: HeroRevealMatcher,
    // Hero of the last payload that named one; unset until the first such payload.
    baseline_hero: Mutex<Option<HeroId>>,
}

impl FeedIngestor {
    pub fn new(store: Arc<SessionStore>, matcher: HeroRevealMatcher) -> Self {
        FeedIngestor {
            store,
            matcher,
            baseline_hero: Mutex::new(None),
        }
    }

    /// Applies one push-feed payload. Telemetry is always replaced; an event
    /// is returned only when the local hero changes after a baseline exists.
    pub fn accept_payload(&self, payload: &FeedPayload) -> Option<FeedEvent> {
        let mut baseline = self.baseline_hero.lock();
        self.store.replace_telemetry(payload.telemetry());

        let current = payload.hero_id()?;
        match baseline.replace(current) {
            None => {
                debug!(hero_id = current, "feed baseline hero established");
                None
            }
            Some(previous) if previous != current => {
                info!(previous, current, "local hero changed");
                Some(FeedEvent::LocalHeroChanged(current))
            }
            Some(_) => None,
        }
    }

    /// Applies one console-log line.
    pub fn accept_line(&self, raw: &str) -> Option<FeedEvent> {
        let line = raw.trim();
        if line.is_empty() {
            return None;
        }

        let Some(reveal) = self.matcher.first_match(line) else {
            trace!(line, "log line ignored");
            return None;
        };

        let addition = self.store.mutate(|s| {
            s.push_log(line);
            s.set_status(&format!("Detected: {}", reveal.hero));
            s.add_enemy_by_internal_name(&reveal.hero)
        });

        match addition {
            RosterAddition::Added(id) => {
                info!(hero = %reveal.hero, hero_id = id, rule = reveal.rule, "enemy hero detected");
                Some(FeedEvent::EnemyHeroDetected(id))
            }
            RosterAddition::AlreadyPresent(id) => {
                debug!(hero = %reveal.hero, hero_id = id, "enemy hero already on roster");
                None
            }
            RosterAddition::Unknown => {
                debug!(hero = %reveal.hero, "revealed hero missing from catalog");
                None
            }
        }
    }
}
