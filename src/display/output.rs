use crate::session::store::{LiveMatchTelemetry, SessionSnapshot};
use chrono::Utc;
use colored::*;
use tabled::{settings::Style, Table, Tabled};

const TABLE_ROWS: usize = 5;

#[derive(Tabled)]
struct CounterRow {
    #[tabled(rename = "Counter")]
    hero: String,
    games: String,
    #[tabled(rename = "Win rate")]
    win_rate: String,
}

#[derive(Tabled)]
struct BestPickRow {
    #[tabled(rename = "#")]
    rank: String,
    #[tabled(rename = "Best pick")]
    hero: String,
    score: String,
}

/// Renders a snapshot as the text panel: status, feed, enemies, telemetry,
/// counters for the most recent hero and the best overall picks.
pub fn render_panel(snap: &SessionSnapshot) -> String {
    let mut out = String::new();

    let loading = if snap.loading { " (working)" } else { "" };
    out.push_str(&format!("{} {}{}\n", "Status:".bold(), snap.status, loading));
    out.push_str(&format!("{} {}\n", "Feed:".bold(), feed_line(snap)));

    let enemies: Vec<String> = snap
        .enemies
        .iter()
        .map(|id| format!("[{}]", snap.catalog.label(*id)))
        .collect();
    out.push_str(&format!(
        "{} {}\n\n",
        "Enemies:".bold(),
        if enemies.is_empty() {
            "-".to_string()
        } else {
            enemies.join(" ")
        }
    ));

    out.push_str(&telemetry_panel(&snap.telemetry));
    out.push_str("\n\n");
    out.push_str(&counter_table(snap));
    out.push_str("\n\n");
    out.push_str(&best_picks_table(snap));
    out.push('\n');

    if !snap.logs.is_empty() {
        out.push_str(&format!("\n{}\n", "Recent log".bold().yellow()));
        for line in &snap.logs {
            out.push_str(&format!("  {}\n", line));
        }
    }

    out
}

fn feed_line(snap: &SessionSnapshot) -> String {
    match snap.feed.last_seen {
        Some(at) => {
            let age = (Utc::now() - at).num_seconds().max(0);
            format!("{} (last {}s ago)", snap.feed.status, age)
        }
        None => snap.feed.status.clone(),
    }
}

fn telemetry_panel(t: &LiveMatchTelemetry) -> String {
    if t.is_pick_stage() {
        return format!(
            "{}\nHero: {}\nMatch: {}",
            "PICK STAGE".bold().cyan(),
            fallback(&t.hero_name, "Not picked"),
            fallback(&t.match_id, "-"),
        );
    }

    format!(
        "{}\nHero: {} (Lv {})\nK/D/A: {}/{}/{}  LH/D: {}/{}\nGPM/XPM: {}/{}  Gold: {} ({}+{})\nHP/MP: {}/{}  {}/{}",
        "IN-GAME".bold().cyan(),
        fallback(&t.hero_name, "Unknown"),
        t.hero_level,
        t.kills,
        t.deaths,
        t.assists,
        t.last_hits,
        t.denies,
        t.gpm,
        t.xpm,
        t.gold,
        t.gold_reliable,
        t.gold_unreliable,
        t.health,
        t.max_health,
        t.mana,
        t.max_mana,
    )
}

fn counter_table(snap: &SessionSnapshot) -> String {
    let title = match snap.last_counter_hero {
        Some(id) => format!("COUNTERS vs {}", snap.catalog.label(id)),
        None => "COUNTERS (waiting for pick...)".to_string(),
    };

    let picks = snap
        .last_counter_hero
        .map(|id| snap.counters_for(id))
        .unwrap_or(&[]);

    let rows: Vec<CounterRow> = (0..TABLE_ROWS)
        .map(|i| match picks.get(i) {
            Some(pick) => CounterRow {
                hero: snap.catalog.label(pick.hero_id),
                games: pick.games_played.to_string(),
                win_rate: format!("{:.1}%", pick.win_rate_against * 100.0),
            },
            None => CounterRow {
                hero: "-".to_string(),
                games: "-".to_string(),
                win_rate: "-".to_string(),
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{}\n{}", title.bold().red(), table)
}

fn best_picks_table(snap: &SessionSnapshot) -> String {
    let rows: Vec<BestPickRow> = (0..TABLE_ROWS)
        .map(|i| match snap.best_picks.get(i) {
            Some(pick) => BestPickRow {
                rank: format!("#{}", i + 1),
                hero: snap.catalog.label(pick.hero_id),
                score: format!("{:.1}%", pick.score * 100.0),
            },
            None => BestPickRow {
                rank: format!("#{}", i + 1),
                hero: "-".to_string(),
                score: "-".to_string(),
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{}\n{}", "BEST PICKS".bold().green(), table)
}

fn fallback<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::matchups::{AggregateRecommendation, CounterPick};
    use crate::session::catalog::HeroCatalog;
    use crate::session::store::SessionStore;

    fn store() -> SessionStore {
        let mut catalog = HeroCatalog::new();
        catalog.insert(14, "pudge", "Pudge");
        catalog.insert(1, "antimage", "Anti-Mage");
        SessionStore::with_catalog(catalog, 10)
    }

    #[test]
    fn empty_session_renders_placeholders() {
        colored::control::set_override(false);
        let panel = render_panel(&store().snapshot(0));
        assert!(panel.contains("Status: Starting..."));
        assert!(panel.contains("Enemies: -"));
        assert!(panel.contains("PICK STAGE"));
        assert!(panel.contains("Not picked"));
        assert!(panel.contains("COUNTERS (waiting for pick...)"));
        assert!(panel.contains("BEST PICKS"));
    }

    #[test]
    fn names_fall_back_to_raw_ids() {
        colored::control::set_override(false);
        let store = store();
        store.add_enemy_by_id(14);
        store.publish_counter_picks(
            14,
            vec![
                CounterPick {
                    hero_id: 1,
                    games_played: 100,
                    win_rate_against: 0.6,
                },
                CounterPick {
                    hero_id: 77,
                    games_played: 40,
                    win_rate_against: 0.55,
                },
            ],
        );
        store.mutate(|s| {
            s.publish_best_picks(vec![AggregateRecommendation {
                hero_id: 7,
                score: 0.35,
            }])
        });

        let panel = render_panel(&store.snapshot(0));
        assert!(panel.contains("[Pudge]"));
        assert!(panel.contains("COUNTERS vs Pudge"));
        assert!(panel.contains("Anti-Mage"));
        assert!(panel.contains("60.0%"));
        assert!(panel.contains("ID 77"));
        assert!(panel.contains("ID 7"));
        assert!(panel.contains("35.0%"));
    }

    #[test]
    fn in_game_panel_shows_stats() {
        colored::control::set_override(false);
        let store = store();
        store.replace_telemetry(LiveMatchTelemetry {
            phase: "DOTA_GAMERULES_STATE_GAME_IN_PROGRESS".to_string(),
            hero_id: 14,
            hero_name: "npc_dota_hero_pudge".to_string(),
            hero_level: 12,
            kills: 4,
            deaths: 2,
            assists: 9,
            ..LiveMatchTelemetry::default()
        });

        let panel = render_panel(&store.snapshot(0));
        assert!(panel.contains("IN-GAME"));
        assert!(panel.contains("(Lv 12)"));
        assert!(panel.contains("K/D/A: 4/2/9"));
    }
}
