//! Authenticated HTTP session produced by a completed handshake.

use std::fmt;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Url};

/// Cookie-carrying HTTP session of one sign-in attempt.
///
/// Only a successful [`CasHandshake::attempt`](crate::CasHandshake::attempt)
/// hands one out. Every attempt builds its own cookie jar, so two sessions
/// never share cookies. Not `Clone`.
pub struct HttpSession {
    client: Client,
    jar: Arc<Jar>,
    final_url: Url,
}

impl HttpSession {
    pub(crate) fn new(client: Client, jar: Arc<Jar>, final_url: Url) -> Self {
        Self {
            client,
            jar,
            final_url,
        }
    }

    /// Redirect-following client that sends this session's cookies.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// URL the handshake's redirect chain landed on.
    pub fn final_url(&self) -> &Url {
        &self.final_url
    }

    /// `loginName` the application put on the landing URL, if any. Looks in
    /// the query first, then in a hash-route fragment.
    pub fn login_name(&self) -> Option<String> {
        if let Some((_, value)) = self
            .final_url
            .query_pairs()
            .find(|(key, _)| key == "loginName")
        {
            return Some(value.into_owned()).filter(|v| !v.is_empty());
        }
        let fragment = self.final_url.fragment()?;
        let start = fragment.find("loginName=")? + "loginName=".len();
        let value = fragment[start..].split('&').next().unwrap_or_default();
        (!value.is_empty()).then(|| value.to_string())
    }

    /// `Cookie` header value this session would send to `url`.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Whether both sessions are backed by the same cookie jar.
    pub fn shares_cookies_with(&self, other: &HttpSession) -> bool {
        Arc::ptr_eq(&self.jar, &other.jar)
    }
}

impl fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSession")
            .field("final_url", &self.final_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(final_url: &str) -> HttpSession {
        HttpSession::new(
            Client::new(),
            Arc::new(Jar::default()),
            Url::parse(final_url).unwrap(),
        )
    }

    #[test]
    fn login_name_from_query() {
        let s = session("https://iclass.buaa.edu.cn:8346/eams-apps/app?loginName=ABC123&x=1");
        assert_eq!(s.login_name().as_deref(), Some("ABC123"));
    }

    #[test]
    fn login_name_from_fragment_route() {
        let s = session("https://iclass.buaa.edu.cn:8346/eams-apps/app#/home?loginName=XYZ&t=2");
        assert_eq!(s.login_name().as_deref(), Some("XYZ"));
    }

    #[test]
    fn login_name_absent() {
        assert_eq!(session("https://iclass.buaa.edu.cn:8346/").login_name(), None);
    }

    #[test]
    fn cookies_are_scoped_to_the_jar() {
        let url = Url::parse("https://iclass.buaa.edu.cn/").unwrap();
        let a = session(url.as_str());
        let b = session(url.as_str());
        a.jar.add_cookie_str("SESSION=abc; Path=/", &url);
        assert_eq!(a.cookie_header(&url).as_deref(), Some("SESSION=abc"));
        assert_eq!(b.cookie_header(&url), None);
        assert!(!a.shares_cookies_with(&b));
        assert!(a.shares_cookies_with(&a));
    }
}
