use serde::{Deserialize, Serialize};

use super::endpoints::HERO_NAME_PREFIX;

pub type HeroId = u32;

// Heroes endpoint response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeroDto {
    pub id: HeroId,
    #[serde(alias = "internalName")]
    pub name: String,
    #[serde(alias = "displayName")]
    pub localized_name: String,
}

impl HeroDto {
    /// Short internal name, e.g. `anti_mage` for `npc_dota_hero_anti_mage`.
    pub fn internal_name(&self) -> &str {
        self.name
            .strip_prefix(HERO_NAME_PREFIX)
            .unwrap_or(&self.name)
    }
}

// Hero matchups endpoint response, one entry per opposing hero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchupRecord {
    #[serde(alias = "heroId")]
    pub hero_id: HeroId,
    #[serde(alias = "gamesPlayed")]
    pub games_played: u32,
    pub wins: u32,
}

impl MatchupRecord {
    #[cfg(test)]
    pub fn new(hero_id: HeroId, games_played: u32, wins: u32) -> Self {
        MatchupRecord {
            hero_id,
            games_played,
            wins,
        }
    }

    /// Win rate of the hero whose matchups these are, against `hero_id`.
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins as f64 / self.games_played as f64
        }
    }
}
