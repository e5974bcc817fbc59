// Form payloads submitted to the SSO during the handshake.
//
// Each execution token is tagged with the page it was scraped from, and each
// form only accepts a token from its own page.

use std::fmt;
use std::marker::PhantomData;

use crate::credentials::Credentials;
use crate::html;

/// `id` of the weak-password interstitial's continue form.
pub const CONTINUE_FORM_ID: &str = "continueForm";

const SUBMIT_LABEL: &str = "登录";

/// Scope marker: token scraped from the SSO login page.
#[derive(Debug, Clone, Copy)]
pub enum LoginPage {}

/// Scope marker: token scraped from the interstitial's continue form.
#[derive(Debug, Clone, Copy)]
pub enum ContinuePage {}

/// Opaque anti-forgery value from a hidden `execution` field, valid for one
/// submission of the page it came from.
pub struct ExecutionToken<Page> {
    value: String,
    _page: PhantomData<Page>,
}

impl<Page> ExecutionToken<Page> {
    fn new(value: String) -> Self {
        Self {
            value,
            _page: PhantomData,
        }
    }

    /// Short prefix safe to put in logs.
    pub fn preview(&self) -> &str {
        let end = self
            .value
            .char_indices()
            .nth(12)
            .map_or(self.value.len(), |(i, _)| i);
        &self.value[..end]
    }

    fn into_inner(self) -> String {
        self.value
    }
}

impl<Page> fmt::Debug for ExecutionToken<Page> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExecutionToken({}…)", self.preview())
    }
}

impl ExecutionToken<LoginPage> {
    /// Scrape the login page's token. Empty values count as missing.
    pub fn from_login_page(document: &str) -> Option<Self> {
        html::hidden_field(document, "execution")
            .filter(|value| !value.is_empty())
            .map(Self::new)
    }
}

/// Why an interstitial page could not yield a continue token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueFormError {
    /// No `<form id="continueForm">` on the page.
    MissingForm,
    /// The form exists but carries no usable `execution` input.
    MissingToken,
}

impl fmt::Display for ContinueFormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContinueFormError::MissingForm => write!(f, "no {CONTINUE_FORM_ID} form on page"),
            ContinueFormError::MissingToken => {
                write!(f, "{CONTINUE_FORM_ID} form has no execution token")
            }
        }
    }
}

impl ExecutionToken<ContinuePage> {
    /// Scrape the continue form's own token; the login form's token on the
    /// same page is ignored.
    pub fn from_interstitial(document: &str) -> Result<Self, ContinueFormError> {
        let form = html::form_by_id(document, CONTINUE_FORM_ID)
            .ok_or(ContinueFormError::MissingForm)?;
        html::hidden_field(form, "execution")
            .filter(|value| !value.is_empty())
            .map(Self::new)
            .ok_or(ContinueFormError::MissingToken)
    }
}

/// Credential submission (`_eventId=submit`).
#[derive(Debug)]
pub struct LoginForm<'a> {
    credentials: &'a Credentials,
    execution: ExecutionToken<LoginPage>,
}

impl<'a> LoginForm<'a> {
    pub fn new(credentials: &'a Credentials, execution: ExecutionToken<LoginPage>) -> Self {
        Self {
            credentials,
            execution,
        }
    }

    /// URL-encodable field list. Consumes the token.
    pub fn into_fields(self) -> Vec<(&'static str, String)> {
        vec![
            ("username", self.credentials.identifier().to_string()),
            ("password", self.credentials.secret().to_string()),
            ("submit", SUBMIT_LABEL.to_string()),
            ("type", "username_password".to_string()),
            ("execution", self.execution.into_inner()),
            ("_eventId", "submit".to_string()),
        ]
    }
}

/// Weak-password "ignore and continue" submission.
#[derive(Debug)]
pub struct ContinueForm {
    execution: ExecutionToken<ContinuePage>,
}

impl ContinueForm {
    pub fn new(execution: ExecutionToken<ContinuePage>) -> Self {
        Self { execution }
    }

    /// URL-encodable field list. Consumes the token.
    pub fn into_fields(self) -> Vec<(&'static str, String)> {
        vec![
            ("execution", self.execution.into_inner()),
            ("_eventId", "ignoreAndContinue".to_string()),
        ]
    }
}
