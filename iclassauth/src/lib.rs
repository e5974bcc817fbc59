// iClassAuth - campus SSO (CAS) sign-in and iClass session bootstrap
//
// Crate root: module declarations, public re-exports and the combined
// sign-in entry point.

pub mod bootstrap;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handshake;
pub mod html;
pub mod session;

// Re-export key types at crate root for convenience.
pub use bootstrap::{AppSession, SessionBootstrapper};
pub use config::{AuthConfig, ConfigError};
pub use credentials::Credentials;
pub use error::{AuthError, Result};
pub use handshake::{CasHandshake, HandshakeState};
pub use session::HttpSession;

/// Everything a signed-in user needs for downstream calls.
#[derive(Debug)]
pub struct SignedIn {
    /// Cookie carrier from the SSO handshake.
    pub http: HttpSession,
    /// iClass API session.
    pub app: AppSession,
}

/// Run the handshake, then the identity exchange for the same identifier.
pub async fn sign_in(
    handshake: &CasHandshake,
    bootstrapper: &SessionBootstrapper,
    credentials: &Credentials,
) -> Result<SignedIn> {
    let http = handshake.attempt(credentials).await?;
    let app = bootstrapper.exchange(&http, credentials.identifier()).await?;
    Ok(SignedIn { http, app })
}
