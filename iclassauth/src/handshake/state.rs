// Handshake state machine.

use reqwest::Url;

use crate::error::AuthError;
use crate::handshake::forms::{ExecutionToken, LoginPage};

/// The current state of a CAS sign-in attempt.
///
/// Each non-terminal state carries exactly the artifact the next transition
/// needs, so a transition cannot run without it.
#[derive(Debug)]
pub enum HandshakeState {
    /// Nothing sent yet.
    Start,

    /// Login page fetched; its execution token is ready for submission.
    AwaitingCredentialSubmission {
        /// Token scraped from the login page.
        execution: ExecutionToken<LoginPage>,
    },

    /// SSO answered with the weak-password interstitial.
    InterstitialPending {
        /// Interstitial page body, holding the continue form.
        page: String,
    },

    /// SSO accepted the login and pointed at the next hop.
    AwaitingRedirectCompletion {
        /// First redirect target, already resolved against the SSO URL.
        location: Url,
    },

    /// Redirect chain landed on the iClass host.
    Authenticated {
        /// Where the chain ended.
        final_url: Url,
    },

    /// Terminal failure.
    Failed(AuthError),
}

impl HandshakeState {
    /// Human-readable label for the current state (used in logs).
    pub fn label(&self) -> &'static str {
        match self {
            HandshakeState::Start => "Start",
            HandshakeState::AwaitingCredentialSubmission { .. } => "AwaitingCredentialSubmission",
            HandshakeState::InterstitialPending { .. } => "InterstitialPending",
            HandshakeState::AwaitingRedirectCompletion { .. } => "AwaitingRedirectCompletion",
            HandshakeState::Authenticated { .. } => "Authenticated",
            HandshakeState::Failed(_) => "Failed",
        }
    }

    /// `Authenticated` and `Failed` end the attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HandshakeState::Authenticated { .. } | HandshakeState::Failed(_)
        )
    }
}

impl From<AuthError> for HandshakeState {
    fn from(err: AuthError) -> Self {
        HandshakeState::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_authenticated_and_failed_are_terminal() {
        let url = Url::parse("https://iclass.buaa.edu.cn:8346/").unwrap();
        let states = [
            HandshakeState::Start,
            HandshakeState::InterstitialPending { page: String::new() },
            HandshakeState::AwaitingRedirectCompletion {
                location: url.clone(),
            },
            HandshakeState::Authenticated { final_url: url },
            HandshakeState::Failed(AuthError::MissingExecutionToken),
        ];
        let terminal: Vec<_> = states
            .iter()
            .filter(|s| s.is_terminal())
            .map(|s| s.label())
            .collect();
        assert_eq!(terminal, ["Authenticated", "Failed"]);
    }

    #[test]
    fn errors_convert_to_failed() {
        let state: HandshakeState = AuthError::Cancelled.into();
        assert!(matches!(state, HandshakeState::Failed(AuthError::Cancelled)));
    }
}
