use crate::error::StatsError;
use crate::rate_limit::RequestGate;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::deadline::Deadline;
use super::endpoints::{hero_matchups_url, heroes_url, API_KEY_PARAM};
use super::models::*;

const USER_AGENT: &str = concat!("dota_counters/", env!("CARGO_PKG_VERSION"));

/// Historical hero statistics, one network round trip per call.
///
/// Implementations never retry; a failed call is reported to the caller.
pub trait StatsGateway: Send + Sync {
    fn hero_catalog(&self, deadline: Deadline) -> Result<Vec<HeroDto>, StatsError>;

    fn hero_matchups(
        &self,
        hero_id: HeroId,
        deadline: Deadline,
    ) -> Result<Vec<MatchupRecord>, StatsError>;
}

pub struct OpenDotaClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
    gate: RequestGate,
}

impl OpenDotaClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new().user_agent(USER_AGENT).build();
        OpenDotaClient {
            agent,
            base_url: base_url.into(),
            api_key,
            gate: RequestGate::default(),
        }
    }

    fn execute_request(&self, url: &str, deadline: Deadline) -> Result<String, StatsError> {
        self.gate.wait(deadline)?;

        let timeout = deadline.remaining().ok_or_else(|| {
            StatsError::Transport("deadline exceeded before request".to_string())
        })?;

        let mut request = self.agent.get(url).timeout(timeout);
        if let Some(key) = &self.api_key {
            request = request.query(API_KEY_PARAM, key);
        }

        debug!(url, timeout_ms = timeout.as_millis() as u64, "stats request");

        match request.call() {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| StatsError::Transport(e.to_string())),
            Err(ureq::Error::Status(code, _)) => Err(StatsError::Status {
                code,
                url: url.to_string(),
            }),
            Err(ureq::Error::Transport(e)) => Err(StatsError::Transport(e.to_string())),
        }
    }
}

impl StatsGateway for OpenDotaClient {
    fn hero_catalog(&self, deadline: Deadline) -> Result<Vec<HeroDto>, StatsError> {
        let body = self.execute_request(&heroes_url(&self.base_url), deadline)?;
        decode(&body)
    }

    fn hero_matchups(
        &self,
        hero_id: HeroId,
        deadline: Deadline,
    ) -> Result<Vec<MatchupRecord>, StatsError> {
        let body = self.execute_request(&hero_matchups_url(&self.base_url, hero_id), deadline)?;
        decode(&body)
    }
}

pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, StatsError> {
    serde_json::from_str(body).map_err(|e| StatsError::Decode(e.to_string()))
}
