// iClassAuth error types

use thiserror::Error;

/// Terminal failure of a sign-in attempt.
///
/// Every variant ends the attempt; nothing is retried internally. Parse
/// failures (the page did not have the shape we expect) are kept apart from
/// rejections (the server looked at what we sent and said no) so callers can
/// choose between re-prompting the user and reporting protocol drift.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    // ── Handshake: parse failures ───────────────────────────────────────
    #[error("login page carried no execution token")]
    MissingExecutionToken,

    #[error("weak-password interstitial could not be parsed: {0}")]
    InterstitialParseError(String),

    #[error("redirect chain ended at {final_url}, not the iClass host")]
    RedirectDidNotReachTarget { final_url: String },

    // ── Handshake: rejections ───────────────────────────────────────────
    #[error("credentials rejected by SSO (HTTP {status})")]
    CredentialRejected { status: u16 },

    #[error("interstitial continue action rejected (HTTP {status})")]
    InterstitialRejected { status: u16 },

    // ── Bootstrap ───────────────────────────────────────────────────────
    #[error("identity exchange failed: {0}")]
    ProfileFetchError(String),

    // ── Transport / lifecycle ───────────────────────────────────────────
    #[error("network error: {0}")]
    NetworkError(String),

    #[error("sign-in attempt cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AuthError {
    /// The server explicitly refused what was submitted.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::CredentialRejected { .. } | AuthError::InterstitialRejected { .. }
        )
    }

    /// A page or redirect did not look the way the protocol expects.
    pub fn is_protocol_drift(&self) -> bool {
        matches!(
            self,
            AuthError::MissingExecutionToken
                | AuthError::InterstitialParseError(_)
                | AuthError::RedirectDidNotReachTarget { .. }
        )
    }

    /// Wrap a `reqwest` failure, keeping the whole source chain so TLS and
    /// resolver errors are not reduced to "error sending request".
    pub(crate) fn network(err: &reqwest::Error) -> Self {
        AuthError::NetworkError(describe(err))
    }
}

pub(crate) fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, AuthError>;
