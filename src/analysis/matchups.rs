use crate::api::models::{HeroId, MatchupRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A candidate ranked by how often it beats one specific opposing hero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CounterPick {
    pub hero_id: HeroId,
    pub games_played: u32,
    pub win_rate_against: f64,
}

/// A candidate ranked by its average advantage over every known enemy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateRecommendation {
    pub hero_id: HeroId,
    pub score: f64,
}

fn has_enough_games(record: &MatchupRecord, min_games: u32) -> bool {
    record.games_played > 0 && record.games_played >= min_games
}

/// Ranks the opponents in `matchups` by their win rate against the hero the
/// matchups belong to. `limit == 0` keeps every qualifying record.
pub fn counter_picks_for(
    matchups: &[MatchupRecord],
    min_games: u32,
    limit: usize,
) -> Vec<CounterPick> {
    let mut counters: Vec<CounterPick> = matchups
        .iter()
        .filter(|m| has_enough_games(m, min_games))
        .map(|m| CounterPick {
            hero_id: m.hero_id,
            games_played: m.games_played,
            win_rate_against: 1.0 - m.win_rate(),
        })
        .collect();

    counters.sort_by(|a, b| {
        b.win_rate_against
            .total_cmp(&a.win_rate_against)
            .then(b.games_played.cmp(&a.games_played))
            .then(a.hero_id.cmp(&b.hero_id))
    });

    if limit > 0 {
        counters.truncate(limit);
    }
    counters
}

/// Averages each candidate's advantage over all enemies.
///
/// The divisor is always the number of enemies: an enemy with no qualifying
/// record for a candidate contributes zero to that candidate's average.
pub fn aggregate_scores(
    per_enemy_matchups: &[Vec<MatchupRecord>],
    min_games: u32,
) -> Vec<AggregateRecommendation> {
    if per_enemy_matchups.is_empty() {
        return Vec::new();
    }

    let mut totals: HashMap<HeroId, f64> = HashMap::new();
    for matchups in per_enemy_matchups {
        for record in matchups.iter().filter(|m| has_enough_games(m, min_games)) {
            *totals.entry(record.hero_id).or_insert(0.0) += 1.0 - record.win_rate();
        }
    }

    let enemy_count = per_enemy_matchups.len() as f64;
    let mut scores: Vec<AggregateRecommendation> = totals
        .into_iter()
        .map(|(hero_id, total)| AggregateRecommendation {
            hero_id,
            score: total / enemy_count,
        })
        .collect();

    scores.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.hero_id.cmp(&b.hero_id)));
    scores
}

/// Drops heroes already on the enemy roster and keeps the top `limit`.
pub fn best_picks(
    scores: Vec<AggregateRecommendation>,
    roster: &[HeroId],
    limit: usize,
) -> Vec<AggregateRecommendation> {
    let enemies: HashSet<HeroId> = roster.iter().copied().collect();
    let picks = scores.into_iter().filter(|s| !enemies.contains(&s.hero_id));

    if limit > 0 {
        picks.take(limit).collect()
    } else {
        picks.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn filters_small_samples_and_computes_rate_against() {
        let matchups = vec![MatchupRecord::new(1, 100, 40), MatchupRecord::new(2, 5, 1)];
        let counters = counter_picks_for(&matchups, 20, 5);

        assert_eq!(counters.len(), 1);
        assert_eq!(counters[0].hero_id, 1);
        assert_eq!(counters[0].games_played, 100);
        assert!((counters[0].win_rate_against - 0.6).abs() < EPS);
    }

    #[test]
    fn zero_game_records_never_qualify() {
        let matchups = vec![MatchupRecord::new(9, 0, 0)];
        assert!(counter_picks_for(&matchups, 0, 0).is_empty());
        assert!(aggregate_scores(&[matchups], 0).is_empty());
    }

    #[test]
    fn counters_sorted_by_rate_then_games() {
        let matchups = vec![
            MatchupRecord::new(1, 100, 50), // 0.5
            MatchupRecord::new(2, 200, 60), // 0.7
            MatchupRecord::new(3, 400, 200), // 0.5, more games
            MatchupRecord::new(4, 30, 9),   // 0.7, fewer games
            MatchupRecord::new(5, 19, 0),   // below min games
        ];
        let counters = counter_picks_for(&matchups, 20, 0);
        let ids: Vec<HeroId> = counters.iter().map(|c| c.hero_id).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);

        for pair in counters.windows(2) {
            assert!(pair[0].win_rate_against >= pair[1].win_rate_against);
            if pair[0].win_rate_against == pair[1].win_rate_against {
                assert!(pair[0].games_played >= pair[1].games_played);
            }
        }
        assert!(counters.iter().all(|c| c.games_played >= 20));
    }

    #[test]
    fn counters_truncate_to_limit() {
        let matchups: Vec<MatchupRecord> = (1..=12)
            .map(|id| MatchupRecord::new(id, 100, id * 5))
            .collect();
        let counters = counter_picks_for(&matchups, 20, 5);
        assert_eq!(counters.len(), 5);
        assert_eq!(counters[0].hero_id, 1);
        assert!(counter_picks_for(&[], 20, 5).is_empty());
    }

    #[test]
    fn no_enemies_means_no_scores() {
        assert!(aggregate_scores(&[], 10).is_empty());
    }

    #[test]
    fn single_enemy_score_is_plain_advantage() {
        let scores = aggregate_scores(&[vec![MatchupRecord::new(7, 80, 20)]], 10);
        assert_eq!(scores.len(), 1);
        assert!((scores[0].score - (1.0 - 20.0 / 80.0)).abs() < EPS);
    }

    #[test]
    fn missing_data_dilutes_the_average() {
        let enemy_a = vec![MatchupRecord::new(7, 100, 30), MatchupRecord::new(8, 100, 50)];
        let enemy_b = vec![MatchupRecord::new(8, 100, 50)];
        let scores = aggregate_scores(&[enemy_a, enemy_b], 10);

        let hero_7 = scores.iter().find(|s| s.hero_id == 7).unwrap();
        assert!((hero_7.score - 0.35).abs() < EPS);

        let hero_8 = scores.iter().find(|s| s.hero_id == 8).unwrap();
        assert!((hero_8.score - 0.5).abs() < EPS);

        assert_eq!(scores[0].hero_id, 8);
    }

    #[test]
    fn best_picks_exclude_roster_members() {
        let per_enemy = vec![
            vec![
                MatchupRecord::new(14, 100, 10),
                MatchupRecord::new(3, 100, 30),
                MatchupRecord::new(4, 100, 60),
            ],
            vec![MatchupRecord::new(2, 100, 5), MatchupRecord::new(3, 100, 30)],
        ];
        let roster = [14, 2];
        let picks = best_picks(aggregate_scores(&per_enemy, 10), &roster, 10);

        assert!(picks.iter().all(|p| !roster.contains(&p.hero_id)));
        let ids: Vec<HeroId> = picks.iter().map(|p| p.hero_id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[test]
    fn best_picks_respect_limit() {
        let per_enemy: Vec<Vec<MatchupRecord>> =
            vec![(1..=30).map(|id| MatchupRecord::new(id, 50, id)).collect()];
        let picks = best_picks(aggregate_scores(&per_enemy, 10), &[1], 10);
        assert_eq!(picks.len(), 10);
        assert_eq!(picks[0].hero_id, 2);
    }
}
