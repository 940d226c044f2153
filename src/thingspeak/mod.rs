pub mod models;

use std::{sync::Arc, time::Duration};

use anyhow::{ensure, Context, Result};
use reqwest::{Client, Url};
use tracing::debug;

use crate::{config::PollConfig, error::PollError};

use self::models::{lowercase_keys, FeedSnapshot, FeedsResponse};

/// Number of most recent entries requested on every poll.
pub const FEED_RESULTS: u32 = 200;

#[derive(Debug, Clone)]
pub struct ThingSpeakClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    base_url: Url,
}

impl ThingSpeakClient {
    /// `request_timeout` bounds every request end to end, so a hung upstream
    /// can never stall a poll cycle indefinitely.
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid ThingSpeak base URL: {base_url:?}"))?;
        ensure!(
            !base_url.cannot_be_a_base(),
            "ThingSpeak base URL must be hierarchical, got: {base_url}"
        );

        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            inner: Arc::new(Inner { http, base_url }),
        })
    }

    /// `{base}/channels/{channel_id}/feeds.json?results=200[&api_key=...]`
    ///
    /// The key is only appended for private channels (non-empty key).
    pub fn feeds_url(&self, poll: &PollConfig) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["channels", poll.channel_id.as_str(), "feeds.json"]);
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("results", &FEED_RESULTS.to_string());
            if !poll.read_api_key.is_empty() {
                query.append_pair("api_key", &poll.read_api_key);
            }
        }
        url
    }

    /// Fetch the latest feed entries for the configured channel.
    pub async fn fetch_feeds(&self, poll: &PollConfig) -> Result<FeedSnapshot, PollError> {
        let url = self.feeds_url(poll);
        debug!(channel_id = %poll.channel_id, "Requesting ThingSpeak feeds");

        let resp = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .map_err(PollError::Request)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PollError::Status(status));
        }

        let bytes = resp.bytes().await.map_err(PollError::Body)?;
        debug!(channel_id = %poll.channel_id, bytes = bytes.len(), "ThingSpeak feeds received");

        decode_feeds(&bytes)
    }
}

/// Decode a feeds body, matching key names case-insensitively.
///
/// A body whose `feeds` is null or absent yields `PollError::MissingFeeds`;
/// an empty array is a valid snapshot with zero entries.
pub fn decode_feeds(bytes: &[u8]) -> Result<FeedSnapshot, PollError> {
    let raw: serde_json::Value = serde_json::from_slice(bytes).map_err(PollError::Decode)?;
    let resp: FeedsResponse =
        serde_json::from_value(lowercase_keys(raw)).map_err(PollError::Decode)?;

    let feeds = resp.feeds.ok_or(PollError::MissingFeeds)?;
    Ok(FeedSnapshot {
        channel: resp.channel,
        feeds,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thingspeak::models::Channel;

    fn client(base: &str) -> ThingSpeakClient {
        ThingSpeakClient::new(base, Duration::from_secs(5)).unwrap()
    }

    fn poll(channel_id: &str, read_api_key: &str) -> PollConfig {
        PollConfig {
            channel_id: channel_id.into(),
            read_api_key: read_api_key.into(),
            poll_interval_secs: 30,
        }
    }

    #[test]
    fn feeds_url_for_public_channel_has_no_api_key() {
        let url = client("https://api.thingspeak.com").feeds_url(&poll("123", ""));
        assert_eq!(
            url.as_str(),
            "https://api.thingspeak.com/channels/123/feeds.json?results=200"
        );
    }

    #[test]
    fn feeds_url_for_private_channel_appends_api_key() {
        let url = client("https://api.thingspeak.com/").feeds_url(&poll("123", "KEY42"));
        assert_eq!(
            url.as_str(),
            "https://api.thingspeak.com/channels/123/feeds.json?results=200&api_key=KEY42"
        );
    }

    #[test]
    fn feeds_url_keeps_base_path_prefix() {
        let url = client("http://localhost:9000/proxy/").feeds_url(&poll("7", ""));
        assert_eq!(
            url.as_str(),
            "http://localhost:9000/proxy/channels/7/feeds.json?results=200"
        );
    }

    #[test]
    fn feeds_url_escapes_channel_id() {
        let url = client("https://api.thingspeak.com").feeds_url(&poll("a/b", ""));
        assert_eq!(url.path(), "/channels/a%2Fb/feeds.json");
    }

    #[test]
    fn new_rejects_invalid_base_url() {
        let err = ThingSpeakClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(err.to_string().contains("invalid ThingSpeak base URL"));
    }

    #[test]
    fn new_rejects_non_hierarchical_base_url() {
        assert!(ThingSpeakClient::new("mailto:ops@example.com", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn decode_full_response() {
        let body = br#"{
            "channel": {"id": 123, "name": "Room", "field1": "Humidity", "last_entry_id": 1},
            "feeds": [
                {"created_at": "2024-01-01T00:00:00Z", "entry_id": 1, "field1": "55", "field2": "21.5"}
            ]
        }"#;
        let s = decode_feeds(body).unwrap();
        assert_eq!(s.channel, Some(Channel { id: 123, name: Some("Room".into()) }));
        assert_eq!(s.feeds.len(), 1);
        assert_eq!(s.feeds[0].entry_id, 1);
        assert_eq!(s.feeds[0].created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(s.feeds[0].field1.as_deref(), Some("55"));
        assert_eq!(s.feeds[0].field2.as_deref(), Some("21.5"));
    }

    #[test]
    fn decode_matches_keys_case_insensitively() {
        let body = br#"{
            "Channel": {"Id": 9, "NAME": "Lab"},
            "Feeds": [{"Entry_ID": 4, "Created_At": "2024-02-01T10:00:00Z", "FIELD1": "40"}]
        }"#;
        let s = decode_feeds(body).unwrap();
        assert_eq!(s.channel.unwrap().id, 9);
        assert_eq!(s.feeds[0].entry_id, 4);
        assert_eq!(s.feeds[0].field1.as_deref(), Some("40"));
    }

    #[test]
    fn decode_tolerates_absent_optional_fields() {
        let body = br#"{"feeds": [{"entry_id": 1, "created_at": "2024-01-01T00:00:00Z", "field2": null}]}"#;
        let s = decode_feeds(body).unwrap();
        assert!(s.channel.is_none());
        assert!(s.feeds[0].field1.is_none());
        assert!(s.feeds[0].field2.is_none());
    }

    #[test]
    fn decode_keeps_malformed_field_values_raw() {
        let body = br#"{"feeds": [{"entry_id": 1, "created_at": "2024-01-01T00:00:00Z", "field1": "nan%", "field2": ""}]}"#;
        let s = decode_feeds(body).unwrap();
        assert_eq!(s.feeds[0].field1.as_deref(), Some("nan%"));
        assert_eq!(s.feeds[0].field2.as_deref(), Some(""));
    }

    #[test]
    fn decode_preserves_upstream_order() {
        let body = br#"{"feeds": [
            {"entry_id": 3, "created_at": "2024-01-01T00:03:00Z"},
            {"entry_id": 1, "created_at": "2024-01-01T00:01:00Z"},
            {"entry_id": 2, "created_at": "2024-01-01T00:02:00Z"}
        ]}"#;
        let ids: Vec<i64> = decode_feeds(body).unwrap().feeds.iter().map(|f| f.entry_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn decode_empty_feeds_is_a_valid_snapshot() {
        let s = decode_feeds(br#"{"channel": {"id": 1}, "feeds": []}"#).unwrap();
        assert!(s.feeds.is_empty());
    }

    #[test]
    fn decode_null_feeds_is_missing() {
        let err = decode_feeds(br#"{"channel": {"id": 1}, "feeds": null}"#).unwrap_err();
        assert!(matches!(err, PollError::MissingFeeds));
    }

    #[test]
    fn decode_absent_feeds_is_missing() {
        let err = decode_feeds(br#"{"channel": {"id": 1}}"#).unwrap_err();
        assert!(matches!(err, PollError::MissingFeeds));
    }

    #[test]
    fn decode_malformed_json_is_decode_error() {
        let err = decode_feeds(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, PollError::Decode(_)));
    }

    #[test]
    fn decode_wrong_shape_is_decode_error() {
        let err = decode_feeds(br#"{"feeds": "nope"}"#).unwrap_err();
        assert!(matches!(err, PollError::Decode(_)));
    }

    #[test]
    fn decode_thingspeak_minus_one_is_decode_error() {
        // ThingSpeak answers `-1` for unknown or private channels.
        let err = decode_feeds(b"-1").unwrap_err();
        assert!(matches!(err, PollError::Decode(_)));
    }
}
