//! Mock SSO + iClass servers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use iclassauth::{AuthConfig, Credentials};
use parking_lot::Mutex;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const STUDENT_ID: &str = "20373001";
pub const PASSWORD: &str = "correct horse";
pub const LOGIN_TOKEN: &str = "e1s1-LOGIN-TOKEN";
pub const CONTINUE_TOKEN: &str = "e1s2-CONTINUE-TOKEN";
pub const LOGIN_NAME: &str = "LN20373001";

pub const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <form id="fm1" action="/login" method="post">
    <input id="username" name="username" type="text" value="">
    <input id="password" name="password" type="password" value="">
    <input type="hidden" name="execution" value="e1s1-LOGIN-TOKEN"/>
    <input type="hidden" name="_eventId" value="submit"/>
  </form>
</body></html>"#;

pub const LOGIN_PAGE_WITHOUT_TOKEN: &str = r#"<!DOCTYPE html>
<html><body><p>Service temporarily unavailable</p></body></html>"#;

pub const INTERSTITIAL_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <p>Your password is weak. Continue in <span id="countdown">5</span>s.</p>
  <form id="fm1"><input type="hidden" name="execution" value="stale-login-scope"></form>
  <form id="continueForm" action="/login" method="post">
    <input type="hidden" name="execution" value="e1s2-CONTINUE-TOKEN">
    <input type="hidden" name="_eventId" value="ignoreAndContinue">
  </form>
</body></html>"#;

pub const INTERSTITIAL_WITHOUT_TOKEN: &str = r#"<!DOCTYPE html>
<html><body>
  <form id="continueForm" action="/login" method="post">
    <input type="hidden" name="_eventId" value="ignoreAndContinue">
  </form>
</body></html>"#;

pub fn credentials() -> Credentials {
    Credentials::new(STUDENT_ID, PASSWORD)
}

/// Responds with a fixed template and records when each request arrived.
#[derive(Clone)]
pub struct ArrivalLog {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    response: ResponseTemplate,
}

impl ArrivalLog {
    pub fn new(response: ResponseTemplate) -> Self {
        Self {
            arrivals: Arc::new(Mutex::new(Vec::new())),
            response,
        }
    }

    pub fn first(&self) -> Option<Instant> {
        self.arrivals.lock().first().copied()
    }
}

impl Respond for ArrivalLog {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().push(Instant::now());
        self.response.clone()
    }
}

/// An SSO server and a separate iClass application server.
pub struct Fixture {
    pub sso: MockServer,
    pub app: MockServer,
}

impl Fixture {
    pub async fn start() -> Self {
        Self {
            sso: MockServer::start().await,
            app: MockServer::start().await,
        }
    }

    pub fn config(&self, interstitial_wait: Duration) -> AuthConfig {
        AuthConfig {
            sso_login_url: format!("{}/login", self.sso.uri()).parse().unwrap(),
            service_url: format!("{}/eams-apps/app", self.app.uri()),
            target_host: self.app.address().ip().to_string(),
            target_port: Some(self.app.address().port()),
            identity_exchange_url: format!("{}/app/user/login.action", self.app.uri())
                .parse()
                .unwrap(),
            interstitial_wait,
            request_timeout: Duration::from_secs(5),
            ..AuthConfig::default()
        }
    }

    /// Where the SSO sends a successful login: the app's ticket endpoint.
    pub fn ticket_url(&self) -> String {
        format!("{}/eams-apps/app?ticket=ST-1-mock", self.app.uri())
    }

    pub fn redirect_to(location: &str) -> ResponseTemplate {
        ResponseTemplate::new(302).insert_header("Location", location)
    }

    pub async fn mount_login_page(&self, body: &str) {
        Mock::given(method("GET"))
            .and(path("/login"))
            .and(query_param("service", format!("{}/eams-apps/app", self.app.uri())))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "JSESSIONID=sso-cookie-1; Path=/")
                    .insert_header("Content-Type", "text/html; charset=utf-8")
                    .set_body_string(body),
            )
            .mount(&self.sso)
            .await;
    }

    /// Credential POST; only matches when the login page's cookie and token
    /// came back.
    pub async fn mount_submit<R: Respond + 'static>(&self, responder: R, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(header_regex("cookie", "JSESSIONID=sso-cookie-1"))
            .and(body_string_contains("_eventId=submit"))
            .and(body_string_contains(format!("execution={LOGIN_TOKEN}")))
            .and(body_string_contains(format!("username={STUDENT_ID}")))
            .respond_with(responder)
            .expect(expected_calls)
            .mount(&self.sso)
            .await;
    }

    /// Interstitial continue POST; only matches the continue form's token.
    pub async fn mount_continue<R: Respond + 'static>(&self, responder: R, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .and(body_string_contains("_eventId=ignoreAndContinue"))
            .and(body_string_contains(format!("execution={CONTINUE_TOKEN}")))
            .respond_with(responder)
            .expect(expected_calls)
            .mount(&self.sso)
            .await;
    }

    /// App side: ticket validation redirects to the landing page, which sets
    /// the application cookie.
    pub async fn mount_app_landing(&self) {
        Mock::given(method("GET"))
            .and(path("/eams-apps/app"))
            .and(query_param("ticket", "ST-1-mock"))
            .respond_with(Self::redirect_to(&format!(
                "{}/eams-apps/home?loginName={LOGIN_NAME}",
                self.app.uri()
            )))
            .mount(&self.app)
            .await;
        Mock::given(method("GET"))
            .and(path("/eams-apps/home"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "SESSION=app-cookie-1; Path=/")
                    .set_body_string("<html>iClass</html>"),
            )
            .mount(&self.app)
            .await;
    }

    pub async fn mount_identity_exchange(&self, status: u16, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/app/user/login.action"))
            .and(query_param("phone", STUDENT_ID))
            .and(query_param("password", ""))
            .and(query_param("verificationType", "2"))
            .and(query_param("verificationUrl", ""))
            .and(query_param("userLevel", "1"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.app)
            .await;
    }

    /// Straight-through login: page, credentials accepted, redirect to app.
    pub async fn mount_happy_path(&self, expected_submits: u64) {
        self.mount_login_page(LOGIN_PAGE).await;
        self.mount_submit(Self::redirect_to(&self.ticket_url()), expected_submits)
            .await;
        self.mount_app_landing().await;
    }

    pub fn exchange_ok() -> serde_json::Value {
        json!({
            "STATUS": "0",
            "result": {
                "id": "8f3c-user",
                "sessionId": "A1B2C3D4",
                "realName": "Li Hua"
            }
        })
    }
}
