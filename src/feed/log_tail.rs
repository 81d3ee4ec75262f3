use crate::session::store::SessionStore;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::ingestor::{FeedEvent, FeedIngestor};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_REOPEN_BACKOFF: Duration = Duration::from_secs(2);
/// Longest line kept; longer runs without a newline are dropped whole.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Follows the game's console log from its current end, feeding each complete
/// line to the ingestor. A missing file is retried forever.
#[derive(Debug, Clone)]
pub struct LogTailer {
    path: PathBuf,
    poll_interval: Duration,
    reopen_backoff: Duration,
}

enum FollowEnd {
    Truncated,
    ReceiverGone,
}

impl LogTailer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LogTailer {
            path: path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            reopen_backoff: DEFAULT_REOPEN_BACKOFF,
        }
    }

    pub fn with_intervals(mut self, poll_interval: Duration, reopen_backoff: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.reopen_backoff = reopen_backoff;
        self
    }

    /// Runs until the event receiver is dropped.
    pub async fn run(
        self,
        ingestor: Arc<FeedIngestor>,
        store: Arc<SessionStore>,
        events: UnboundedSender<FeedEvent>,
    ) {
        loop {
            if events.is_closed() {
                return;
            }

            let file = match File::open(&self.path).await {
                Ok(file) => file,
                Err(e) => {
                    debug!(path = %self.path.display(), error = %e, "console log unavailable");
                    store.set_status("Log file not found...");
                    tokio::time::sleep(self.reopen_backoff).await;
                    continue;
                }
            };

            info!(path = %self.path.display(), "tailing console log");
            match self.follow(file, &ingestor, &events).await {
                Ok(FollowEnd::ReceiverGone) => return,
                Ok(FollowEnd::Truncated) => {
                    info!(path = %self.path.display(), "console log truncated, reopening");
                    store.push_log("Console log truncated, reopening");
                }
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "console log read failed");
                    tokio::time::sleep(self.reopen_backoff).await;
                }
            }
        }
    }

    async fn follow(
        &self,
        mut file: File,
        ingestor: &FeedIngestor,
        events: &UnboundedSender<FeedEvent>,
    ) -> std::io::Result<FollowEnd> {
        let mut position = file.seek(SeekFrom::End(0)).await?;
        let mut reader = BufReader::new(file);
        let mut pending: Vec<u8> = Vec::new();
        let mut discarding = false;

        loop {
            let room = (MAX_LINE_BYTES + 1 - pending.len()) as u64;
            let read = (&mut reader).take(room).read_until(b'\n', &mut pending).await?;
            if read == 0 {
                if events.is_closed() {
                    return Ok(FollowEnd::ReceiverGone);
                }
                let len = tokio::fs::metadata(&self.path).await?.len();
                if len < position {
                    return Ok(FollowEnd::Truncated);
                }
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            position += read as u64;
            // Partial line: keep it until the writer finishes it.
            if pending.last() != Some(&b'\n') {
                if pending.len() > MAX_LINE_BYTES {
                    if !discarding {
                        warn!(limit = MAX_LINE_BYTES, "console log line too long, discarding");
                    }
                    pending.clear();
                    discarding = true;
                }
                continue;
            }

            if discarding {
                pending.clear();
                discarding = false;
                continue;
            }

            let line = String::from_utf8_lossy(&pending).into_owned();
            pending.clear();

            if let Some(event) = ingestor.accept_line(&line) {
                if events.send(event).is_err() {
                    return Ok(FollowEnd::ReceiverGone);
                }
            }
        }
    }
}
