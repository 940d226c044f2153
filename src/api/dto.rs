use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `GET /api/feeds` before the first successful poll, or once the
/// last snapshot has expired.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoDataResponse {
    pub message: String,
}

impl NoDataResponse {
    pub fn not_yet() -> Self {
        Self {
            message: "No cached data yet.".to_owned(),
        }
    }
}
