use reqwest::StatusCode;
use thiserror::Error;

/// Why a poll cycle did not publish a snapshot.
///
/// None of these is fatal: the poller logs the error and tries again after
/// the next interval.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("ThingSpeak request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("ThingSpeak returned error status {0}")]
    Status(StatusCode),

    #[error("failed to read ThingSpeak response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("failed to decode ThingSpeak feeds response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("ThingSpeak response has no feeds collection")]
    MissingFeeds,
}

impl PollError {
    /// Coarse category used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            PollError::Request(_) | PollError::Status(_) | PollError::Body(_) => "fetch",
            PollError::Decode(_) => "decode",
            PollError::MissingFeeds => "empty",
        }
    }
}
