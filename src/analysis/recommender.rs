use crate::api::client::StatsGateway;
use crate::api::deadline::Deadline;
use crate::api::models::{HeroId, MatchupRecord};
use crate::error::StatsError;
use crate::feed::ingestor::FeedEvent;
use crate::session::store::SessionStore;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::matchups::{aggregate_scores, best_picks, counter_picks_for};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub counter_min_games: u32,
    pub counter_limit: usize,
    pub aggregate_min_games: u32,
    pub aggregate_limit: usize,
    /// Deadline for the triggering hero's own matchups.
    pub lookup_timeout: Duration,
    /// Deadline for each roster fetch of the aggregate step.
    pub request_timeout: Duration,
    /// Bound on a whole run.
    pub run_timeout: Duration,
    /// Pause between consecutive roster fetches.
    pub request_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            counter_min_games: 20,
            counter_limit: 5,
            aggregate_min_games: 10,
            aggregate_limit: 10,
            lookup_timeout: Duration::from_secs(20),
            request_timeout: Duration::from_secs(10),
            run_timeout: Duration::from_secs(60),
            request_delay: Duration::from_millis(100),
        }
    }
}

/// Per-hero recommendation run: direct counters for the new hero, then the
/// best overall picks against the whole roster.
///
/// Concurrent runs only meet inside the store; whichever finishes last owns
/// the published aggregate list.
#[derive(Clone)]
pub struct RecommendationPipeline {
    gateway: Arc<dyn StatsGateway>,
    store: Arc<SessionStore>,
    settings: PipelineSettings,
}

impl RecommendationPipeline {
    pub fn new(
        gateway: Arc<dyn StatsGateway>,
        store: Arc<SessionStore>,
        settings: PipelineSettings,
    ) -> Self {
        RecommendationPipeline {
            gateway,
            store,
            settings,
        }
    }

    /// Runs the pipeline on the blocking pool.
    pub fn spawn(&self, hero_id: HeroId) -> JoinHandle<()> {
        let pipeline = self.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = pipeline.run(hero_id) {
                warn!(hero_id, error = %e, "recommendation run aborted");
            }
        })
    }

    pub fn run(&self, hero_id: HeroId) -> Result<(), StatsError> {
        let run_deadline = Deadline::after(self.settings.run_timeout);
        let label = self.store.hero_label(hero_id);
        self.store
            .begin_task(&format!("Fetching matchups for {}...", label));

        let matchups = match self.gateway.hero_matchups(
            hero_id,
            run_deadline.earliest(Deadline::after(self.settings.lookup_timeout)),
        ) {
            Ok(matchups) => matchups,
            Err(e) => {
                self.fail(&format!("Matchups for {} failed: {}", label, e));
                return Err(e);
            }
        };

        let counters = counter_picks_for(
            &matchups,
            self.settings.counter_min_games,
            self.settings.counter_limit,
        );
        debug!(hero_id, counters = counters.len(), "counter picks ready");
        self.store.publish_counter_picks(hero_id, counters);

        let roster = self.store.enemy_roster();
        let per_enemy = match self.fetch_roster_matchups(&roster, run_deadline) {
            Ok(per_enemy) => per_enemy,
            Err(e) => {
                self.fail(&format!("Best-pick analysis failed: {}", e));
                return Err(e);
            }
        };

        let picks = best_picks(
            aggregate_scores(&per_enemy, self.settings.aggregate_min_games),
            &roster,
            self.settings.aggregate_limit,
        );
        info!(hero_id, enemies = roster.len(), picks = picks.len(), "recommendations updated");

        let done = format!("Recommendations updated for {}", label);
        self.store.mutate(|s| {
            s.publish_best_picks(picks);
            s.finish_task(Some(&done));
        });
        Ok(())
    }

    fn fetch_roster_matchups(
        &self,
        roster: &[HeroId],
        run_deadline: Deadline,
    ) -> Result<Vec<Vec<MatchupRecord>>, StatsError> {
        let mut per_enemy = Vec::with_capacity(roster.len());

        for (index, &enemy_id) in roster.iter().enumerate() {
            if index > 0 && !self.settings.request_delay.is_zero() {
                debug!(delay_ms = self.settings.request_delay.as_millis() as u64, "rate limit delay");
                thread::sleep(self.settings.request_delay);
            }

            if run_deadline.is_expired() {
                return Err(StatsError::Transport(
                    "run deadline exceeded before roster fetch".to_string(),
                ));
            }

            let deadline = run_deadline.earliest(Deadline::after(self.settings.request_timeout));
            per_enemy.push(self.gateway.hero_matchups(enemy_id, deadline)?);
        }

        Ok(per_enemy)
    }

    fn fail(&self, message: &str) {
        self.store.mutate(|s| {
            s.finish_task(Some(message));
            s.push_log(message);
        });
    }
}

/// Consumes pick events, spawning one pipeline run per newly rostered hero.
///
/// A local-hero change is promoted onto the roster by id so that draft picks
/// get recommendations even without the console log.
pub async fn dispatch_events(
    mut events: UnboundedReceiver<FeedEvent>,
    store: Arc<SessionStore>,
    pipeline: RecommendationPipeline,
) {
    while let Some(event) = events.recv().await {
        let hero_id = match event {
            FeedEvent::EnemyHeroDetected(hero_id) => hero_id,
            FeedEvent::LocalHeroChanged(hero_id) => {
                if !store.add_enemy_by_id(hero_id) {
                    debug!(hero_id, "local hero already on roster");
                    continue;
                }
                hero_id
            }
        };

        info!(hero_id, "starting recommendation run");
        pipeline.spawn(hero_id);
    }
}
