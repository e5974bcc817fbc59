//! iClass API records and the shaping applied to them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display name for a course the API returned without one.
pub const UNKNOWN_COURSE: &str = "Unknown course";

/// One academic term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
    pub code: String,
    pub name: String,
    /// `yearStatus == "1"`: the term in progress.
    pub current: bool,
}

/// A course the user is enrolled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub name: String,
    pub id: String,
}

/// One scheduled class meeting and its check-in state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRecord {
    pub course_name: String,
    pub course_id: String,
    pub course_sched_id: String,
    /// `teachTime` as returned, used for ordering.
    pub teach_time: String,
    /// `teachTime` as `YYYY-MM-DD`.
    pub date: String,
    /// The record exactly as the API sent it.
    pub full_record: Value,
}

/// String form of a JSON string or number field.
pub(crate) fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn semester_from(value: &Value) -> Option<Semester> {
    Some(Semester {
        code: scalar(value.get("code")).filter(|c| !c.is_empty())?,
        name: scalar(value.get("name")).unwrap_or_default(),
        current: scalar(value.get("yearStatus")).as_deref() == Some("1"),
    })
}

/// The term in progress, else the first listed.
pub fn pick_current(semesters: Vec<Semester>) -> Option<Semester> {
    let current = semesters.iter().position(|s| s.current).unwrap_or(0);
    semesters.into_iter().nth(current)
}

/// Courses from a course-list result. Entries without an id are dropped.
pub(crate) fn courses_from(result: &[Value]) -> Vec<Course> {
    result
        .iter()
        .filter_map(|entry| {
            let id = scalar(entry.get("course_id")).filter(|id| !id.is_empty())?;
            let name = scalar(entry.get("course_name"))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNKNOWN_COURSE.to_string());
            Some(Course { name, id })
        })
        .collect()
}

/// Check-in records for `course`, newest `teachTime` first.
pub(crate) fn sign_records_from(course: &Course, result: Vec<Value>) -> Vec<SignRecord> {
    let mut records: Vec<SignRecord> = result
        .into_iter()
        .filter_map(|record| {
            let teach_time = scalar(record.get("teachTime"))?;
            let course_sched_id = scalar(record.get("courseSchedId"))?;
            Some(SignRecord {
                course_name: course.name.clone(),
                course_id: course.id.clone(),
                course_sched_id,
                date: format_teach_date(&teach_time),
                teach_time,
                full_record: record,
            })
        })
        .collect();
    records.sort_by(|a, b| b.teach_time.cmp(&a.teach_time));
    records
}

/// `YYYYMMDD…` → `YYYY-MM-DD…`. Anything shorter or non-numeric in the date
/// part is returned unchanged.
pub fn format_teach_date(teach_time: &str) -> String {
    let bytes = teach_time.as_bytes();
    if bytes.len() < 8 || !bytes[..8].iter().all(u8::is_ascii_digit) {
        return teach_time.to_string();
    }
    format!(
        "{}-{}-{}",
        &teach_time[..4],
        &teach_time[4..6],
        &teach_time[6..]
    )
}
