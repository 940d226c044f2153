use std::{sync::Arc, time::Duration};

use tokio::time;
use tracing::{info, warn};

use crate::{
    config::PollConfig,
    error::PollError,
    feed_cache::{FeedCache, FEEDS_KEY},
    shutdown::Shutdown,
    thingspeak::{models::FeedSnapshot, ThingSpeakClient},
};

/// Lower bound for how long a published snapshot stays readable.
const MIN_CACHE_TTL_SECS: u64 = 60;

/// `max(60s, 3 × interval)`: a snapshot survives at least two missed polls
/// before readers see it disappear.
pub fn cache_ttl(poll_interval_secs: u64) -> Duration {
    Duration::from_secs(MIN_CACHE_TTL_SECS.max(poll_interval_secs.saturating_mul(3)))
}

pub struct PollerService {
    client: ThingSpeakClient,
    cache: FeedCache,
    poll: PollConfig,
    interval: Duration,
    ttl: Duration,
}

impl PollerService {
    pub fn new(client: ThingSpeakClient, cache: FeedCache, poll: PollConfig) -> Self {
        Self {
            client,
            cache,
            interval: Duration::from_secs(poll.poll_interval_secs),
            ttl: cache_ttl(poll.poll_interval_secs),
            poll,
        }
    }

    /// Runs the fetch → decode → publish loop until `shutdown` fires.
    /// Spawn this via `tokio::spawn`.
    ///
    /// Both suspension points (the upstream request and the sleep between
    /// cycles) race against `shutdown`, so an in-flight request is dropped
    /// rather than awaited.
    pub async fn run(self, mut shutdown: Shutdown) {
        info!(
            channel_id = %self.poll.channel_id,
            interval_secs = self.interval.as_secs(),
            ttl_secs = self.ttl.as_secs(),
            "Feed polling loop started"
        );

        loop {
            if shutdown.is_triggered() {
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                result = self.poll_once() => {
                    if let Err(e) = result {
                        warn!(
                            channel_id = %self.poll.channel_id,
                            kind = e.kind(),
                            error = %e,
                            "Poll cycle failed; keeping previous snapshot"
                        );
                    }
                }
            }

            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = time::sleep(self.interval) => {}
            }
        }

        info!(channel_id = %self.poll.channel_id, "Feed polling loop stopped");
    }

    /// One cycle: fetch and decode the channel feed, then publish it.
    ///
    /// On any error nothing is written, so the previous snapshot stays
    /// readable until its own TTL runs out. Returns the number of entries
    /// published.
    pub async fn poll_once(&self) -> Result<usize, PollError> {
        let snapshot = self.client.fetch_feeds(&self.poll).await?;
        Ok(self.publish(snapshot).await)
    }

    async fn publish(&self, snapshot: FeedSnapshot) -> usize {
        let entries = snapshot.feeds.len();
        self.cache
            .set(FEEDS_KEY, Arc::new(snapshot), self.ttl)
            .await;

        info!(
            channel_id = %self.poll.channel_id,
            entries,
            ttl_secs = self.ttl.as_secs(),
            "Feed snapshot published"
        );
        entries
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
