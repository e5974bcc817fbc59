//! Handshake configuration.
//!
//! Everything the handshake needs to know about the outside world lives in
//! [`AuthConfig`]. There is no module-level client or endpoint state: each
//! [`CasHandshake`](crate::CasHandshake) owns the config it was built with.

use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

/// Production SSO login endpoint.
pub const DEFAULT_SSO_LOGIN_URL: &str = "https://sso.buaa.edu.cn/login";
/// CAS `service` the SSO redirects back to after login.
pub const DEFAULT_SERVICE_URL: &str = "https://iclass.buaa.edu.cn:8346/eams-apps/app";
/// Host that marks the end of a successful redirect chain.
pub const DEFAULT_TARGET_HOST: &str = "iclass.buaa.edu.cn";
/// Identity-exchange endpoint.
pub const DEFAULT_IDENTITY_EXCHANGE_URL: &str =
    "https://iclass.buaa.edu.cn:8346/app/user/login.action";
/// The SSO disables "ignore and continue" for a countdown; 6 s clears it.
pub const DEFAULT_INTERSTITIAL_WAIT: Duration = Duration::from_secs(6);

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";

/// Errors raised while loading an [`AuthConfig`] from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Configuration for a [`CasHandshake`](crate::CasHandshake) and
/// [`SessionBootstrapper`](crate::SessionBootstrapper).
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// SSO login endpoint (GET for the form, POST for submissions).
    pub sso_login_url: Url,
    /// Value of the CAS `service` query parameter.
    pub service_url: String,
    /// Host the final redirect must land on.
    pub target_host: String,
    /// Optional port the final redirect must land on. `None` matches any port.
    pub target_port: Option<u16>,
    /// Identity-exchange endpoint used by the bootstrapper.
    pub identity_exchange_url: Url,
    /// How long to wait on the weak-password interstitial before continuing.
    /// Must not be shorter than the server's countdown.
    pub interstitial_wait: Duration,
    /// Verify TLS certificates. Turning this off is an explicit downgrade.
    pub verify_certificates: bool,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Maximum redirects followed on redirect-following requests.
    pub max_redirects: usize,
    /// `User-Agent` sent on every request.
    pub user_agent: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            sso_login_url: Url::parse(DEFAULT_SSO_LOGIN_URL).expect("static URL"),
            service_url: DEFAULT_SERVICE_URL.to_string(),
            target_host: DEFAULT_TARGET_HOST.to_string(),
            target_port: None,
            identity_exchange_url: Url::parse(DEFAULT_IDENTITY_EXCHANGE_URL).expect("static URL"),
            interstitial_wait: DEFAULT_INTERSTITIAL_WAIT,
            verify_certificates: true,
            request_timeout: Duration::from_secs(30),
            max_redirects: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AuthConfig {
    /// Load configuration from `ICLASS_*` environment variables, falling back
    /// to the production defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// Lets tests supply variables without touching the process environment.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let mut config = Self::default();

        if let Ok(raw) = reader("ICLASS_SSO_LOGIN_URL") {
            config.sso_login_url = parse_url("ICLASS_SSO_LOGIN_URL", &raw)?;
        }
        if let Ok(raw) = reader("ICLASS_SERVICE_URL") {
            config.service_url = raw;
        }
        if let Ok(raw) = reader("ICLASS_TARGET_HOST") {
            config.target_host = raw;
        }
        if let Ok(raw) = reader("ICLASS_TARGET_PORT") {
            let port = raw.parse::<u16>().map_err(|e| {
                ConfigError::InvalidValue("ICLASS_TARGET_PORT".into(), e.to_string())
            })?;
            config.target_port = Some(port);
        }
        if let Ok(raw) = reader("ICLASS_IDENTITY_EXCHANGE_URL") {
            config.identity_exchange_url = parse_url("ICLASS_IDENTITY_EXCHANGE_URL", &raw)?;
        }
        if let Ok(raw) = reader("ICLASS_INTERSTITIAL_WAIT_MS") {
            let ms = raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("ICLASS_INTERSTITIAL_WAIT_MS".into(), e.to_string())
            })?;
            config.interstitial_wait = Duration::from_millis(ms);
        }
        if let Ok(raw) = reader("ICLASS_VERIFY_TLS") {
            config.verify_certificates = raw.parse::<bool>().map_err(|e| {
                ConfigError::InvalidValue("ICLASS_VERIFY_TLS".into(), e.to_string())
            })?;
        }
        if let Ok(raw) = reader("ICLASS_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("ICLASS_TIMEOUT_SECS".into(), e.to_string())
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Whether `url` is on the iClass application host.
    pub fn reaches_target(&self, url: &Url) -> bool {
        let host_matches = url
            .host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(&self.target_host));
        let port_matches = match self.target_port {
            Some(port) => url.port_or_known_default() == Some(port),
            None => true,
        };
        host_matches && port_matches
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidValue(key.into(), e.to_string()))
}
