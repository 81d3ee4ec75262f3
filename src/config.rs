use crate::api::endpoints::DEFAULT_BASE_URL;
use crate::error::AppError;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_FEED_ADDR: &str = "127.0.0.1:3001";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub feed_addr: SocketAddr,
    pub console_log: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_key = env::var("OPENDOTA_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let base_url =
            env::var("OPENDOTA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let feed_addr = parse_addr(
            &env::var("FEED_ADDR").unwrap_or_else(|_| DEFAULT_FEED_ADDR.to_string()),
        )?;

        let console_log = env::var("DOTA_CONSOLE_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_console_log());

        Ok(Config {
            api_key,
            base_url,
            feed_addr,
            console_log,
        })
    }
}

pub fn parse_addr(raw: &str) -> Result<SocketAddr, AppError> {
    raw.trim()
        .parse()
        .map_err(|e| AppError::ConfigError(format!("invalid feed address {:?}: {}", raw, e)))
}

/// Where Steam keeps the game's console log in a default single-library install.
pub fn default_console_log() -> PathBuf {
    let steam_root = if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Program Files (x86)\Steam")
    } else {
        dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Steam")
    };

    steam_root
        .join("steamapps")
        .join("common")
        .join("dota 2 beta")
        .join("game")
        .join("dota")
        .join("console.log")
}
