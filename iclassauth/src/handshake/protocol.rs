// CAS sign-in handshake against the campus SSO.
//
//   Client                                   SSO / iClass
//     |--- GET  /login?service=… ---------------->|   login page + execution
//     |--- POST /login (credentials) ------------>|
//     |<-- 3xx Location ------------- or 401 -----|   (401 = weak-password page)
//     |        [401] wait, POST ignoreAndContinue |
//     |<-- 3xx Location --------------------------|
//     |--- GET Location, follow redirects ------->|   lands on the iClass host

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::cookie::Jar;
use reqwest::header::{LOCATION, REFERER};
use reqwest::{redirect, Client, Response, StatusCode, Url};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::credentials::Credentials;
use crate::error::{AuthError, Result};
use crate::handshake::forms::{ContinueForm, ExecutionToken, LoginForm, LoginPage};
use crate::handshake::state::HandshakeState;
use crate::session::HttpSession;

/// Marker in a post-login redirect that points at the weak-password page.
const WEAK_PASSWORD_MARKER: &str = "weakpasswordpage";

/// Drives the CAS login state machine.
///
/// One `CasHandshake` can serve many attempts, concurrently if shared behind
/// an `Arc`: every attempt gets a fresh cookie jar and fresh clients. Failure
/// reasons are recorded per identifier, so one user's outcome never touches
/// another's.
#[derive(Debug)]
pub struct CasHandshake {
    config: AuthConfig,
    failures: Mutex<HashMap<String, AuthError>>,
}

/// Per-attempt HTTP state. Both clients write to the same jar.
struct Transport {
    jar: Arc<Jar>,
    /// Redirects disabled: form submissions, where the status is the branch.
    manual: Client,
    /// Redirects followed: login page fetch and the final redirect chain.
    following: Client,
}

impl CasHandshake {
    /// Create a handshake driver for the given configuration.
    pub fn new(config: AuthConfig) -> Result<Self> {
        if config.target_host.is_empty() {
            return Err(AuthError::InvalidConfig("target host is empty".into()));
        }
        if !config.verify_certificates {
            warn!("TLS certificate verification is disabled for SSO sign-in");
        }
        Ok(Self {
            config,
            failures: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Reason the most recent attempt for `identifier` failed. A successful
    /// attempt for the same identifier clears it.
    pub fn last_failure(&self, identifier: &str) -> Option<AuthError> {
        self.failures.lock().get(identifier).cloned()
    }

    /// Run one sign-in attempt to a terminal state.
    pub async fn attempt(&self, credentials: &Credentials) -> Result<HttpSession> {
        self.attempt_with_cancellation(credentials, &CancellationToken::new())
            .await
    }

    /// Run one sign-in attempt, giving up with [`AuthError::Cancelled`] as soon
    /// as `cancel` fires.
    ///
    /// Cancellation drops whatever request or wait is in flight together with
    /// the partially filled cookie jar; no further request is sent.
    pub async fn attempt_with_cancellation(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<HttpSession> {
        let outcome = self.run(credentials, cancel).await;
        match &outcome {
            Ok(session) => {
                info!(final_url = %session.final_url(), "SSO sign-in complete");
                self.failures.lock().remove(credentials.identifier());
            }
            Err(err) => {
                warn!(error = %err, "SSO sign-in failed");
                self.failures
                    .lock()
                    .insert(credentials.identifier().to_string(), err.clone());
            }
        }
        outcome
    }

    async fn run(&self, credentials: &Credentials, cancel: &CancellationToken) -> Result<HttpSession> {
        let transport = self.transport()?;
        let mut state = HandshakeState::Start;

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => HandshakeState::Failed(AuthError::Cancelled),
                next = self.step(state, &transport, credentials) => next,
            };
            debug!(state = next.label(), "handshake transition");

            match next {
                HandshakeState::Authenticated { final_url } => {
                    return Ok(HttpSession::new(transport.following, transport.jar, final_url));
                }
                HandshakeState::Failed(err) => return Err(err),
                other => state = other,
            }
        }
    }

    /// Perform the single transition out of `state`.
    async fn step(
        &self,
        state: HandshakeState,
        transport: &Transport,
        credentials: &Credentials,
    ) -> HandshakeState {
        let next = match state {
            HandshakeState::Start => self.fetch_login_page(transport).await,
            HandshakeState::AwaitingCredentialSubmission { execution } => {
                self.submit_credentials(transport, credentials, execution).await
            }
            HandshakeState::InterstitialPending { page } => {
                self.continue_interstitial(transport, &page).await
            }
            HandshakeState::AwaitingRedirectCompletion { location } => {
                self.complete_redirects(transport, location).await
            }
            terminal @ (HandshakeState::Authenticated { .. } | HandshakeState::Failed(_)) => {
                Ok(terminal)
            }
        };
        next.unwrap_or_else(HandshakeState::from)
    }

    // ── Transitions ─────────────────────────────────────────────────────

    /// Start → AwaitingCredentialSubmission.
    async fn fetch_login_page(&self, transport: &Transport) -> Result<HandshakeState> {
        debug!(url = %self.config.sso_login_url, "fetching SSO login page");
        let response = transport
            .following
            .get(self.config.sso_login_url.clone())
            .query(&[("service", self.config.service_url.as_str())])
            .send()
            .await
            .map_err(|e| AuthError::network(&e))?;
        let page = response.text().await.map_err(|e| AuthError::network(&e))?;

        let execution =
            ExecutionToken::from_login_page(&page).ok_or(AuthError::MissingExecutionToken)?;
        debug!(execution = execution.preview(), "login page execution token found");
        Ok(HandshakeState::AwaitingCredentialSubmission { execution })
    }

    /// AwaitingCredentialSubmission → InterstitialPending | AwaitingRedirectCompletion.
    async fn submit_credentials(
        &self,
        transport: &Transport,
        credentials: &Credentials,
        execution: ExecutionToken<LoginPage>,
    ) -> Result<HandshakeState> {
        let fields = LoginForm::new(credentials, execution).into_fields();
        let response = self.post_form(transport, &fields).await?;
        let status = response.status();
        debug!(status = status.as_u16(), "credential submission answered");

        if status == StatusCode::UNAUTHORIZED {
            // 401 here is the weak-password notice, not a refusal.
            let page = response.text().await.map_err(|e| AuthError::network(&e))?;
            info!("SSO flagged a weak password; interstitial pending");
            return Ok(HandshakeState::InterstitialPending { page });
        }

        let Some(location) = self.redirect_target(&response) else {
            return Err(AuthError::CredentialRejected {
                status: status.as_u16(),
            });
        };

        if location.as_str().contains(WEAK_PASSWORD_MARKER) {
            info!("SSO redirected to the weak-password page; interstitial pending");
            let page = transport
                .manual
                .get(location)
                .send()
                .await
                .map_err(|e| AuthError::network(&e))?
                .text()
                .await
                .map_err(|e| AuthError::network(&e))?;
            return Ok(HandshakeState::InterstitialPending { page });
        }

        Ok(HandshakeState::AwaitingRedirectCompletion { location })
    }

    /// InterstitialPending → AwaitingRedirectCompletion.
    async fn continue_interstitial(
        &self,
        transport: &Transport,
        page: &str,
    ) -> Result<HandshakeState> {
        let execution = ExecutionToken::from_interstitial(page)
            .map_err(|e| AuthError::InterstitialParseError(e.to_string()))?;

        debug!(
            wait_ms = self.config.interstitial_wait.as_millis() as u64,
            "waiting out the interstitial countdown"
        );
        tokio::time::sleep(self.config.interstitial_wait).await;

        let fields = ContinueForm::new(execution).into_fields();
        let response = self.post_form(transport, &fields).await?;
        let status = response.status();
        debug!(status = status.as_u16(), "interstitial continue answered");

        self.redirect_target(&response)
            .map(|location| HandshakeState::AwaitingRedirectCompletion { location })
            .ok_or(AuthError::InterstitialRejected {
                status: status.as_u16(),
            })
    }

    /// AwaitingRedirectCompletion → Authenticated.
    async fn complete_redirects(
        &self,
        transport: &Transport,
        location: Url,
    ) -> Result<HandshakeState> {
        debug!(location = %location, "following post-login redirect chain");
        let response = match transport.following.get(location.clone()).send().await {
            Ok(response) => response,
            // Redirect loop or a chain longer than `max_redirects`.
            Err(e) if e.is_redirect() => {
                return Err(AuthError::RedirectDidNotReachTarget {
                    final_url: e.url().unwrap_or(&location).to_string(),
                });
            }
            Err(e) => return Err(AuthError::network(&e)),
        };
        let final_url = response.url().clone();

        if self.config.reaches_target(&final_url) {
            Ok(HandshakeState::Authenticated { final_url })
        } else {
            Err(AuthError::RedirectDidNotReachTarget {
                final_url: final_url.to_string(),
            })
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    async fn post_form(
        &self,
        transport: &Transport,
        fields: &[(&'static str, String)],
    ) -> Result<Response> {
        transport
            .manual
            .post(self.config.sso_login_url.clone())
            .header(REFERER, self.config.sso_login_url.as_str())
            .form(fields)
            .send()
            .await
            .map_err(|e| AuthError::network(&e))
    }

    /// `Location` of a 3xx response, resolved against the SSO URL.
    fn redirect_target(&self, response: &Response) -> Option<Url> {
        if !response.status().is_redirection() {
            return None;
        }
        let raw = response.headers().get(LOCATION)?.to_str().ok()?;
        response.url().join(raw).ok()
    }

    fn transport(&self) -> Result<Transport> {
        let jar = Arc::new(Jar::default());
        let manual = self
            .client_builder(&jar)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| AuthError::network(&e))?;
        let following = self
            .client_builder(&jar)
            .redirect(redirect::Policy::limited(self.config.max_redirects))
            .build()
            .map_err(|e| AuthError::network(&e))?;
        Ok(Transport {
            jar,
            manual,
            following,
        })
    }

    fn client_builder(&self, jar: &Arc<Jar>) -> reqwest::ClientBuilder {
        Client::builder()
            .cookie_provider(Arc::clone(jar))
            .timeout(self.config.request_timeout)
            .user_agent(self.config.user_agent.clone())
            .danger_accept_invalid_certs(!self.config.verify_certificates)
    }
}
