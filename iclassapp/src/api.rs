//! iClass application API client.
//!
//! Every call carries the app session id in a `sessionId` header and is judged
//! by HTTP 200 plus `STATUS == "0"` in the JSON envelope.

use iclassauth::bootstrap::STATUS_OK;
use iclassauth::{AppSession, HttpSession};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{Endpoints, COURSES_PATH, SEMESTER_PATH, SIGN_DETAIL_PATH};
use crate::error::{AppError, Result};
use crate::models::{self, Course, Semester, SignRecord};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "STATUS")]
    status: Option<Value>,
    #[serde(default)]
    result: Value,
}

/// Client for the course and check-in endpoints of one signed-in user.
#[derive(Debug, Clone)]
pub struct IclassClient {
    http: Client,
    endpoints: Endpoints,
    session: AppSession,
}

impl IclassClient {
    /// Use the SSO session's cookies for every call.
    pub fn new(http: &HttpSession, session: AppSession, endpoints: Endpoints) -> Self {
        Self::with_client(http.client().clone(), session, endpoints)
    }

    /// Use an arbitrary client; the `sessionId` alone authenticates the API.
    pub fn with_client(http: Client, session: AppSession, endpoints: Endpoints) -> Self {
        Self {
            http,
            endpoints,
            session,
        }
    }

    pub fn session(&self) -> &AppSession {
        &self.session
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The term in progress, or the first term listed.
    pub async fn current_semester(&self) -> Result<Semester> {
        let url = self.endpoints.api(SEMESTER_PATH)?;
        let result = self
            .get_result(
                "semester list",
                url,
                &[("userId", self.session.user_id.as_str()), ("type", "2")],
            )
            .await?;
        let semesters = as_array(result)
            .iter()
            .filter_map(models::semester_from)
            .collect();
        let semester = models::pick_current(semesters).ok_or(AppError::NoSemester)?;
        info!(code = %semester.code, name = %semester.name, "semester selected");
        Ok(semester)
    }

    /// Courses the user is enrolled in for `semester_code`.
    pub async fn courses(&self, semester_code: &str) -> Result<Vec<Course>> {
        let url = self.endpoints.api(COURSES_PATH)?;
        let result = self
            .get_result(
                "course list",
                url,
                &[
                    ("user_type", "1"),
                    ("id", self.session.user_id.as_str()),
                    ("xq_code", semester_code),
                ],
            )
            .await?;
        let courses = models::courses_from(&as_array(result));
        debug!(count = courses.len(), semester = semester_code, "courses listed");
        Ok(courses)
    }

    /// Check-in records for one course, newest first.
    ///
    /// A course the API reports nothing for (no result, or a non-OK status)
    /// yields an empty list rather than an error.
    pub async fn sign_records(&self, course: &Course) -> Result<Vec<SignRecord>> {
        let url = self.endpoints.api(SIGN_DETAIL_PATH)?;
        let envelope = self
            .get_envelope(
                "sign detail",
                url,
                &[
                    ("id", self.session.user_id.as_str()),
                    ("courseId", course.id.as_str()),
                    ("sessionId", self.session.session_id.as_str()),
                ],
            )
            .await?;
        let status = status_of(&envelope);
        if status != STATUS_OK {
            debug!(course = %course.id, status = %status, "no sign records");
            return Ok(Vec::new());
        }
        let records = models::sign_records_from(course, as_array(envelope.result));
        debug!(course = %course.id, count = records.len(), "sign records fetched");
        Ok(records)
    }

    /// Records of every course in `courses`, course by course.
    pub async fn all_sign_records(&self, courses: &[Course]) -> Result<Vec<SignRecord>> {
        let mut all = Vec::new();
        for course in courses {
            all.extend(self.sign_records(course).await?);
        }
        Ok(all)
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    async fn get_result(
        &self,
        endpoint: &'static str,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        let envelope = self.get_envelope(endpoint, url, query).await?;
        let status = status_of(&envelope);
        if status != STATUS_OK {
            return Err(AppError::ApiStatus { endpoint, status });
        }
        Ok(envelope.result)
    }

    async fn get_envelope(
        &self,
        endpoint: &'static str,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Envelope> {
        let response = self
            .http
            .get(url)
            .query(query)
            .header("sessionId", self.session.session_id.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::Http {
                endpoint,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::UnexpectedStatus {
                endpoint,
                status: status.as_u16(),
            });
        }
        let body = response.text().await.map_err(|e| AppError::Http {
            endpoint,
            detail: e.to_string(),
        })?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn status_of(envelope: &Envelope) -> String {
    models::scalar(envelope.status.as_ref()).unwrap_or_default()
}

fn as_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}
