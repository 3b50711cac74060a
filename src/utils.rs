use std::time::Duration;

use chrono::Utc;
use rand::Rng;

use crate::error::GatewayError;

/// Splits a comma separated setting into trimmed, non-empty entries.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Extracts the id from a `spotify:playlist:<id>` uri.
pub fn parse_playlist_id(uri: &str) -> Result<String, GatewayError> {
    let parts: Vec<&str> = uri.split(':').collect();

    match parts.as_slice() {
        ["spotify", "playlist", id] if !id.is_empty() => Ok(id.to_string()),
        _ => Err(GatewayError::Validation(format!(
            "'{uri}' is not a spotify:playlist:<id> uri"
        ))),
    }
}

/// Uniformly random start offset in `[0, total)`; 0 for empty playlists.
pub fn random_offset(total: u64) -> u64 {
    if total <= 1 {
        return 0;
    }
    rand::rng().random_range(0..total)
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Time left until `epoch_millis`, or `None` when it already passed.
///
/// Moments so far back that the difference overflows count as passed.
pub fn delay_until(epoch_millis: i64) -> Option<Duration> {
    let delay = epoch_millis.checked_sub(now_millis())?;
    u64::try_from(delay).ok().map(Duration::from_millis)
}
