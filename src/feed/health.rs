use crate::session::store::{SelfTest, SessionStore};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const CHECK_INTERVAL: Duration = Duration::from_secs(2);
pub const STALE_AFTER: Duration = Duration::from_secs(10);

const SELF_TEST_ATTEMPTS: u32 = 5;
const SELF_TEST_SPACING: Duration = Duration::from_millis(500);
const SELF_TEST_BODY: &str = r#"{"player":{"team_name":"spectator"},"draft":{"picks_bans":[]}}"#;

pub fn describe_feed(
    last_seen: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> String {
    let Some(last_seen) = last_seen else {
        return "No data".to_string();
    };

    let silent = (now - last_seen).to_std().unwrap_or_default();
    if silent < stale_after {
        "Live".to_string()
    } else {
        format!("Stale ({}s)", silent.as_secs())
    }
}

/// Periodically refreshes the feed status line from the last-seen timestamp.
pub async fn run_health_check(store: Arc<SessionStore>, interval: Duration, stale_after: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let last_seen = store.read(|s| s.feed().last_seen);
        let status = describe_feed(last_seen, Utc::now(), stale_after);
        store.set_feed_status(&status);
    }
}

/// Posts a minimal document to the local listener to prove the ingress works.
pub async fn self_test(addr: SocketAddr, store: Arc<SessionStore>) -> bool {
    let url = format!("http://{}/", addr);

    for attempt in 1..=SELF_TEST_ATTEMPTS {
        let target = url.clone();
        let posted = tokio::task::spawn_blocking(move || {
            ureq::post(&target)
                .timeout(Duration::from_secs(2))
                .set("Content-Type", "application/json")
                .send_string(SELF_TEST_BODY)
                .map(|_| ())
        })
        .await;

        match posted {
            Ok(Ok(())) => {
                info!(attempt, "feed self-test passed");
                store.mutate(|s| {
                    s.set_self_test(SelfTest::Passed);
                    s.push_log("Feed self-test OK");
                });
                return true;
            }
            Ok(Err(e)) => warn!(attempt, error = %e, "feed self-test attempt failed"),
            Err(e) => warn!(attempt, error = %e, "feed self-test task failed"),
        }

        tokio::time::sleep(SELF_TEST_SPACING).await;
    }

    store.mutate(|s| {
        s.set_self_test(SelfTest::Failed);
        s.push_log("Feed self-test failed");
    });
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ingestor::FeedIngestor;
    use crate::feed::patterns::HeroRevealMatcher;
    use crate::feed::server::{router, FeedServerState};
    use chrono::Duration as ChronoDuration;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    #[test]
    fn feed_status_tracks_silence() {
        let now = Utc::now();
        assert_eq!(describe_feed(None, now, STALE_AFTER), "No data");
        assert_eq!(
            describe_feed(Some(now - ChronoDuration::seconds(3)), now, STALE_AFTER),
            "Live"
        );
        assert_eq!(
            describe_feed(Some(now - ChronoDuration::seconds(42)), now, STALE_AFTER),
            "Stale (42s)"
        );
        // Clock skew into the future still counts as live.
        assert_eq!(
            describe_feed(Some(now + ChronoDuration::seconds(1)), now, STALE_AFTER),
            "Live"
        );
    }

    #[tokio::test]
    async fn health_check_updates_status() {
        let store = Arc::new(SessionStore::new(10));
        store.mark_feed_seen(Utc::now());
        let handle = tokio::spawn(run_health_check(
            store.clone(),
            Duration::from_millis(10),
            STALE_AFTER,
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.snapshot(0).feed.status, "Live");
        handle.abort();
    }

    #[tokio::test]
    async fn self_test_reaches_running_listener() {
        let store = Arc::new(SessionStore::new(10));
        let ingestor = Arc::new(FeedIngestor::new(
            store.clone(),
            HeroRevealMatcher::standard().unwrap(),
        ));
        let (tx, _rx) = mpsc::unbounded_channel();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(FeedServerState::new(store.clone(), ingestor, tx));
        let server = tokio::spawn(async move { axum::serve(listener, app).await });

        assert!(self_test(addr, store.clone()).await);
        let snap = store.snapshot(0);
        assert_eq!(snap.feed.self_test, SelfTest::Passed);
        assert!(snap.feed.last_seen.is_some());
        assert_eq!(snap.telemetry.hero_id, 0);

        server.abort();
    }
}
