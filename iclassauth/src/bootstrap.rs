//! Identity exchange: trade an SSO-authenticated session for an iClass API
//! session.

use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::session::HttpSession;

/// `STATUS` value the iClass API uses for success.
pub const STATUS_OK: &str = "0";

/// Application-level session every downstream API call is made with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSession {
    pub user_id: String,
    pub session_id: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeEnvelope {
    #[serde(rename = "STATUS")]
    status: Option<Value>,
    result: Option<ExchangeResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeResult {
    id: Option<Value>,
    session_id: Option<Value>,
    real_name: Option<String>,
}

/// Issues the identity-exchange call after a successful handshake.
///
/// Performs no retry; the call is idempotent, so callers may retry it.
#[derive(Debug, Clone)]
pub struct SessionBootstrapper {
    exchange_url: Url,
}

impl SessionBootstrapper {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            exchange_url: config.identity_exchange_url.clone(),
        }
    }

    /// Exchange `identifier` for an [`AppSession`] over `session`.
    ///
    /// Succeeds only on HTTP 200 with `STATUS == "0"` and a result carrying
    /// both ids. `session` is only read.
    pub async fn exchange(&self, session: &HttpSession, identifier: &str) -> Result<AppSession> {
        debug!(url = %self.exchange_url, "exchanging identity for app session");
        let response = session
            .client()
            .get(self.exchange_url.clone())
            .query(&[
                ("phone", identifier),
                ("password", ""),
                ("verificationType", "2"),
                ("verificationUrl", ""),
                ("userLevel", "1"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::network(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AuthError::ProfileFetchError(format!("HTTP {}", status.as_u16())));
        }

        let body = response.text().await.map_err(|e| AuthError::network(&e))?;
        let app = parse_exchange(&body, identifier)?;
        info!(user_id = %app.user_id, "app session established");
        Ok(app)
    }
}

/// Parse an identity-exchange body into an [`AppSession`].
fn parse_exchange(body: &str, identifier: &str) -> Result<AppSession> {
    let envelope: ExchangeEnvelope = serde_json::from_str(body)
        .map_err(|e| AuthError::ProfileFetchError(format!("malformed body: {e}")))?;

    let status = envelope.status.as_ref().and_then(scalar).unwrap_or_default();
    if status != STATUS_OK {
        return Err(AuthError::ProfileFetchError(format!("STATUS={status:?}")));
    }

    let result = envelope
        .result
        .ok_or_else(|| AuthError::ProfileFetchError("missing result".into()))?;
    let user_id = result
        .id
        .as_ref()
        .and_then(scalar)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AuthError::ProfileFetchError("missing result.id".into()))?;
    let session_id = result
        .session_id
        .as_ref()
        .and_then(scalar)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AuthError::ProfileFetchError("missing result.sessionId".into()))?;
    let display_name = result
        .real_name
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| identifier.to_string());

    Ok(AppSession {
        user_id,
        session_id,
        display_name,
    })
}

/// String form of a JSON string or number.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
