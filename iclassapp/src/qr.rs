//! Scan-to-sign URLs, the payload of the check-in QR code.

use reqwest::Url;

use crate::config::{Endpoints, SCAN_SIGN_PATH};
use crate::error::{AppError, Result};

/// URL a phone opens to check in to `course_sched_id`.
///
/// `timestamp` is milliseconds since the epoch, as the iClass app sends it.
pub fn sign_url(endpoints: &Endpoints, course_sched_id: &str, timestamp: i64) -> Result<Url> {
    let mut url = endpoints
        .sign_base
        .join(SCAN_SIGN_PATH)
        .map_err(|e| AppError::InvalidUrl(e.to_string()))?;
    url.query_pairs_mut()
        .append_pair("courseSchedId", course_sched_id)
        .append_pair("timestamp", &timestamp.to_string());
    Ok(url)
}
