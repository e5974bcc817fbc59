// Login credentials for one handshake attempt.

use std::fmt;

use zeroize::Zeroizing;

/// Student identifier and SSO password.
///
/// Immutable once built; the secret is wiped from memory on drop and never
/// appears in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    identifier: String,
    secret: Zeroizing<String>,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Both fields are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.identifier.is_empty() && !self.secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}
