use crate::api::models::HeroId;
use crate::session::store::LiveMatchTelemetry;
use serde::Deserialize;

/// One push-feed document. Every section is optional on the wire and unknown
/// fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedPayload {
    pub provider: ProviderSection,
    pub map: MapSection,
    pub player: PlayerSection,
    pub hero: HeroSection,
    pub draft: DraftSection,
    pub auth: AuthSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub name: String,
    pub appid: i64,
    pub version: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MapSection {
    pub name: String,
    pub matchid: String,
    pub game_time: i64,
    pub clock_time: i64,
    pub game_state: String,
    pub phase: String,
}

impl MapSection {
    /// Older feeds send `phase`, current ones only `game_state`.
    pub fn effective_phase(&self) -> &str {
        if self.phase.is_empty() {
            &self.game_state
        } else {
            &self.phase
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayerSection {
    pub steamid: String,
    pub accountid: String,
    pub name: String,
    pub team_name: String,
    pub activity: String,
    pub player_slot: i32,
    pub team_slot: i32,
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

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeroSection {
    pub id: i64,
    pub name: String,
    pub level: i32,
    pub xp: i32,
    pub health: i32,
    pub max_health: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub health_percent: i32,
    pub mana_percent: i32,
    pub alive: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DraftSection {
    pub picks_bans: Vec<DraftEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DraftEntry {
    pub is_pick: bool,
    pub hero_id: i64,
    pub team: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub token: String,
}

impl FeedPayload {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// The local player's hero, if one is selected.
    pub fn hero_id(&self) -> Option<HeroId> {
        HeroId::try_from(self.hero.id).ok().filter(|id| *id > 0)
    }

    pub fn telemetry(&self) -> LiveMatchTelemetry {
        LiveMatchTelemetry {
            phase: self.map.effective_phase().to_string(),
            match_id: self.map.matchid.clone(),
            map_name: self.map.name.clone(),
            game_time: self.map.game_time,
            clock_time: self.map.clock_time,
            hero_id: self.hero_id().unwrap_or(0),
            hero_name: self.hero.name.clone(),
            hero_level: self.hero.level,
            health: self.hero.health,
            max_health: self.hero.max_health,
            mana: self.hero.mana,
            max_mana: self.hero.max_mana,
            kills: self.player.kills,
            deaths: self.player.deaths,
            assists: self.player.assists,
            last_hits: self.player.last_hits,
            denies: self.player.denies,
            gold: self.player.gold,
            gold_reliable: self.player.gold_reliable,
            gold_unreliable: self.player.gold_unreliable,
            gpm: self.player.gpm,
            xpm: self.player.xpm,
        }
    }
}
