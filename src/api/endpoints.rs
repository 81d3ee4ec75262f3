// Statistics service endpoints and URL builders

use super::models::HeroId;

pub const DEFAULT_BASE_URL: &str = "https://api.opendota.com/api";
pub const HERO_NAME_PREFIX: &str = "npc_dota_hero_";
pub const API_KEY_PARAM: &str = "api_key";

pub fn heroes_url(base_url: &str) -> String {
    format!("{}/heroes", base_url.trim_end_matches('/'))
}

pub fn hero_matchups_url(base_url: &str, hero_id: HeroId) -> String {
    format!("{}/heroes/{}/matchups", base_url.trim_end_matches('/'), hero_id)
}
