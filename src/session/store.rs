use crate::analysis::matchups::{AggregateRecommendation, CounterPick};
use crate::api::models::HeroId;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::catalog::HeroCatalog;

pub const DEFAULT_LOG_RING: usize = 10;

/// Opposing heroes seen this session, in detection order, each at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnemyRoster {
    ids: Vec<HeroId>,
}

impl EnemyRoster {
    /// Appends `id` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, id: HeroId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn contains(&self, id: HeroId) -> bool {
        self.ids.contains(&id)
    }

    pub fn as_slice(&self) -> &[HeroId] {
        &self.ids
    }
}

/// Latest values reported by the push feed. Replaced wholesale per payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveMatchTelemetry {
    pub phase: String,
    pub match_id: String,
    pub map_name: String,
    pub game_time: i64,
    pub clock_time: i64,
    pub hero_id: HeroId,
    pub hero_name: String,
    pub hero_level: i32,
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
    pub last_hits: i32,
    pub denies: i32,
    pub gold: i32,
    pub gold_reliable: i32,
    pub gold_unreliable: i32,
    pub gpm: i32,
    pub xpm: i32,
}

impl LiveMatchTelemetry {
    /// Draft or hero-less states render as the pick stage.
    pub fn is_pick_stage(&self) -> bool {
        self.hero_id == 0
            || self.phase == "picks"
            || self.phase == "DOTA_GAMERULES_STATE_HERO_SELECTION"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfTest {
    Pending,
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedHealth {
    pub status: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub self_test: SelfTest,
}

impl Default for FeedHealth {
    fn default() -> Self {
        FeedHealth {
            status: "No data".to_string(),
            last_seen: None,
            self_test: SelfTest::Pending,
        }
    }
}

/// Result of adding a hero to the roster by internal name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterAddition {
    Added(HeroId),
    AlreadyPresent(HeroId),
    Unknown,
}

/// The single mutable session aggregate. Only reachable through
/// [`SessionStore::mutate`] and the store's named operations.
#[derive(Debug)]
pub struct SessionState {
    catalog: Arc<HeroCatalog>,
    roster: EnemyRoster,
    counter_picks: HashMap<HeroId, Vec<CounterPick>>,
    last_counter_hero: Option<HeroId>,
    best_picks: Vec<AggregateRecommendation>,
    telemetry: LiveMatchTelemetry,
    feed: FeedHealth,
    status: String,
    tasks_in_flight: u32,
    logs: VecDeque<String>,
    log_capacity: usize,
}

impl SessionState {
    fn new(catalog: Arc<HeroCatalog>, log_capacity: usize) -> Self {
        let log_capacity = log_capacity.max(1);
        SessionState {
            catalog,
            roster: EnemyRoster::default(),
            counter_picks: HashMap::new(),
            last_counter_hero: None,
            best_picks: Vec::new(),
            telemetry: LiveMatchTelemetry::default(),
            feed: FeedHealth::default(),
            status: "Starting...".to_string(),
            tasks_in_flight: 0,
            logs: VecDeque::with_capacity(log_capacity),
            log_capacity,
        }
    }

    pub fn feed(&self) -> &FeedHealth {
        &self.feed
    }

    pub fn publish_catalog(&mut self, catalog: Arc<HeroCatalog>) {
        self.catalog = catalog;
    }

    pub fn add_enemy_by_id(&mut self, id: HeroId) -> bool {
        self.roster.push(id)
    }

    pub fn add_enemy_by_internal_name(&mut self, internal: &str) -> RosterAddition {
        match self.catalog.resolve(internal) {
            Err(_) => RosterAddition::Unknown,
            Ok(id) if self.roster.push(id) => RosterAddition::Added(id),
            Ok(id) => RosterAddition::AlreadyPresent(id),
        }
    }

    pub fn replace_telemetry(&mut self, telemetry: LiveMatchTelemetry) {
        self.telemetry = telemetry;
    }

    pub fn publish_counter_picks(&mut self, hero_id: HeroId, picks: Vec<CounterPick>) {
        self.counter_picks.insert(hero_id, picks);
        self.last_counter_hero = Some(hero_id);
    }

    pub fn publish_best_picks(&mut self, picks: Vec<AggregateRecommendation>) {
        self.best_picks = picks;
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    /// Marks a background task as running; `loading` stays set until every
    /// started task has finished.
    pub fn begin_task(&mut self, status: &str) {
        self.tasks_in_flight += 1;
        self.set_status(status);
    }

    pub fn finish_task(&mut self, status: Option<&str>) {
        self.tasks_in_flight = self.tasks_in_flight.saturating_sub(1);
        if let Some(status) = status {
            self.set_status(status);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.tasks_in_flight > 0
    }

    pub fn push_log(&mut self, line: &str) {
        while self.logs.len() >= self.log_capacity {
            self.logs.pop_front();
        }
        self.logs.push_back(line.to_string());
    }

    pub fn mark_feed_seen(&mut self, at: DateTime<Utc>) {
        self.feed.last_seen = Some(at);
    }

    pub fn set_feed_status(&mut self, status: &str) {
        self.feed.status = status.to_string();
    }

    pub fn set_self_test(&mut self, result: SelfTest) {
        self.feed.self_test = result;
    }
}

/// Independent copy of the whole session taken under one read lock.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub catalog: Arc<HeroCatalog>,
    pub enemies: Vec<HeroId>,
    pub counter_picks: HashMap<HeroId, Vec<CounterPick>>,
    pub last_counter_hero: Option<HeroId>,
    pub best_picks: Vec<AggregateRecommendation>,
    pub telemetry: LiveMatchTelemetry,
    pub feed: FeedHealth,
    pub status: String,
    pub loading: bool,
    pub logs: Vec<String>,
}

impl SessionSnapshot {
    pub fn counters_for(&self, hero_id: HeroId) -> &[CounterPick] {
        self.counter_picks
            .get(&hero_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Concurrent owner of the session state.
///
/// Writers are serialized; a snapshot copies every field under the same read
/// lock, so readers never see half of a compound update.
#[derive(Debug)]
pub struct SessionStore {
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub fn new(log_capacity: usize) -> Self {
        SessionStore::with_catalog(HeroCatalog::new(), log_capacity)
    }

    pub fn with_catalog(catalog: HeroCatalog, log_capacity: usize) -> Self {
        SessionStore {
            state: RwLock::new(SessionState::new(Arc::new(catalog), log_capacity)),
        }
    }

    pub fn mutate<R>(&self, apply: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.state.write();
        apply(&mut state)
    }

    pub fn read<R>(&self, inspect: impl FnOnce(&SessionState) -> R) -> R {
        let state = self.state.read();
        inspect(&state)
    }

    /// `max_log_lines == 0` returns the whole diagnostic ring.
    pub fn snapshot(&self, max_log_lines: usize) -> SessionSnapshot {
        let state = self.state.read();

        let skip = if max_log_lines > 0 {
            state.logs.len().saturating_sub(max_log_lines)
        } else {
            0
        };

        SessionSnapshot {
            catalog: Arc::clone(&state.catalog),
            enemies: state.roster.as_slice().to_vec(),
            counter_picks: state.counter_picks.clone(),
            last_counter_hero: state.last_counter_hero,
            best_picks: state.best_picks.clone(),
            telemetry: state.telemetry.clone(),
            feed: state.feed.clone(),
            status: state.status.clone(),
            loading: state.is_loading(),
            logs: state.logs.iter().skip(skip).cloned().collect(),
        }
    }

    pub fn enemy_roster(&self) -> Vec<HeroId> {
        self.read(|s| s.roster.as_slice().to_vec())
    }

    pub fn hero_label(&self, id: HeroId) -> String {
        self.read(|s| s.catalog.label(id))
    }

    pub fn add_enemy_by_id(&self, id: HeroId) -> bool {
        self.mutate(|s| s.add_enemy_by_id(id))
    }

    pub fn replace_telemetry(&self, telemetry: LiveMatchTelemetry) {
        self.mutate(|s| s.replace_telemetry(telemetry));
    }

    pub fn publish_counter_picks(&self, hero_id: HeroId, picks: Vec<CounterPick>) {
        self.mutate(|s| s.publish_counter_picks(hero_id, picks));
    }

    pub fn set_status(&self, status: &str) {
        self.mutate(|s| s.set_status(status));
    }

    pub fn begin_task(&self, status: &str) {
        self.mutate(|s| s.begin_task(status));
    }

    pub fn finish_task(&self, status: Option<&str>) {
        self.mutate(|s| s.finish_task(status));
    }

    pub fn push_log(&self, line: &str) {
        self.mutate(|s| s.push_log(line));
    }

    pub fn mark_feed_seen(&self, at: DateTime<Utc>) {
        self.mutate(|s| s.mark_feed_seen(at));
    }

    pub fn set_feed_status(&self, status: &str) {
        self.mutate(|s| s.set_feed_status(status));
    }

    pub fn set_self_test(&self, result: SelfTest) {
        self.mutate(|s| s.set_self_test(result));
    }
}
