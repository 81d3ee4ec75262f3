use crate::api::deadline::Deadline;
use crate::error::StatsError;
use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::thread;
use tracing::debug;

// OpenDota allows 60 requests/minute without a key; stay well under a burst of that.
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;

/// Process-wide request quota for the statistics service.
///
/// Waiting for quota is a self-imposed delay, never an error, unless the
/// caller's deadline would pass first.
pub struct RequestGate {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    clock: DefaultClock,
}

impl RequestGate {
    pub fn per_second(requests: u32) -> Self {
        let per_second = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        RequestGate {
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            clock: DefaultClock::default(),
        }
    }

    /// Blocks until a request may be sent.
    pub fn wait(&self, deadline: Deadline) -> Result<(), StatsError> {
        loop {
            match self.limiter.check() {
                Ok(()) => return Ok(()),
                Err(not_until) => {
                    let wait = not_until.wait_time_from(self.clock.now());
                    match deadline.remaining() {
                        Some(left) if left > wait => {
                            debug!(wait_ms = wait.as_millis() as u64, "request quota exhausted, pausing");
                            thread::sleep(wait);
                        }
                        _ => {
                            return Err(StatsError::Transport(
                                "deadline exceeded while waiting for request quota".to_string(),
                            ))
                        }
                    }
                }
            }
        }
    }
}

impl Default for RequestGate {
    fn default() -> Self {
        RequestGate::per_second(DEFAULT_REQUESTS_PER_SECOND)
    }
}
