use crate::analysis::matchups::{AggregateRecommendation, CounterPick};
use crate::api::models::HeroId;
use crate::error::AppError;
use crate::session::store::{LiveMatchTelemetry, SelfTest, SessionSnapshot, SessionStore};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::ingestor::{FeedEvent, FeedIngestor};
use super::payload::FeedPayload;

#[derive(Clone)]
pub struct FeedServerState {
    store: Arc<SessionStore>,
    ingestor: Arc<FeedIngestor>,
    events: UnboundedSender<FeedEvent>,
}

impl FeedServerState {
    pub fn new(
        store: Arc<SessionStore>,
        ingestor: Arc<FeedIngestor>,
        events: UnboundedSender<FeedEvent>,
    ) -> Self {
        FeedServerState {
            store,
            ingestor,
            events,
        }
    }
}

/// Session view for external consumers: everything except the catalog,
/// the roster and the diagnostic ring.
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub status: String,
    pub loading: bool,
    pub feed_status: String,
    pub feed_last_seen: Option<DateTime<Utc>>,
    pub feed_self_test: SelfTest,
    pub telemetry: LiveMatchTelemetry,
    pub last_counter_hero: Option<HeroId>,
    pub counter_picks: BTreeMap<HeroId, Vec<CounterPick>>,
    pub best_picks: Vec<AggregateRecommendation>,
}

impl From<SessionSnapshot> for SnapshotResponse {
    fn from(snap: SessionSnapshot) -> Self {
        SnapshotResponse {
            status: snap.status,
            loading: snap.loading,
            feed_status: snap.feed.status,
            feed_last_seen: snap.feed.last_seen,
            feed_self_test: snap.feed.self_test,
            telemetry: snap.telemetry,
            last_counter_hero: snap.last_counter_hero,
            counter_picks: snap.counter_picks.into_iter().collect(),
            best_picks: snap.best_picks,
        }
    }
}

pub fn router(state: FeedServerState) -> Router {
    Router::new()
        .route("/", get(liveness).post(ingest))
        .route("/snapshot", get(snapshot))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: FeedServerState) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "feed listener started");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn liveness() -> &'static str {
    "ok"
}

async fn snapshot(State(state): State<FeedServerState>) -> Json<SnapshotResponse> {
    Json(state.store.snapshot(0).into())
}

async fn ingest(State(state): State<FeedServerState>, body: Bytes) -> StatusCode {
    let payload = match FeedPayload::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, bytes = body.len(), "rejected malformed feed payload");
            return StatusCode::BAD_REQUEST;
        }
    };

    if !payload.auth.token.is_empty() {
        debug!(token = %payload.auth.token, "feed payload carries auth token");
    }

    state.store.mark_feed_seen(Utc::now());
    if let Some(event) = state.ingestor.accept_payload(&payload) {
        if state.events.send(event).is_err() {
            warn!(?event, "event dispatcher stopped, dropping feed event");
        }
    }

    StatusCode::OK
}
