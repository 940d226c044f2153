use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Feed response: GET /channels/{id}/feeds.json
//
//   {
//     "channel": { "id": 123, "name": "Room", "field1": "Humidity", ... },
//     "feeds": [
//       { "created_at": "2024-01-01T00:00:00Z", "entry_id": 1,
//         "field1": "55", "field2": "21.5" }
//     ]
//   }
//
// Any extra keys ThingSpeak sends (description, latitude, last_entry_id,
// field3..field8, ...) are ignored.
// ---------------------------------------------------------------------------

/// Wire shape of the upstream body. `feeds` stays optional here so that a
/// null/absent collection can be told apart from an empty one.
#[derive(Debug, Deserialize)]
pub struct FeedsResponse {
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub feeds: Option<Vec<FeedEntry>>,
}

/// Channel descriptor as reported by ThingSpeak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Channel {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// One reading row.
///
/// `field1`/`field2` are kept as the raw strings ThingSpeak sends; upstream
/// devices regularly post malformed numbers, so no coercion happens here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FeedEntry {
    pub entry_id: i64,
    pub created_at: DateTime<Utc>,
    /// Relative humidity, raw.
    #[serde(default)]
    pub field1: Option<String>,
    /// Temperature, raw.
    #[serde(default)]
    pub field2: Option<String>,
}

/// Immutable result of one successful fetch. Entries keep upstream order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FeedSnapshot {
    pub channel: Option<Channel>,
    pub feeds: Vec<FeedEntry>,
}

/// Lowercase every object key, recursively.
///
/// ThingSpeak is not consistent about key casing across its endpoints, and
/// serde matches names exactly, so the body is normalised before typed
/// deserialisation.
pub(crate) fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), lowercase_keys(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}
