//! iClass application endpoints.

use reqwest::Url;

use crate::error::{AppError, Result};

/// Production application API base.
pub const DEFAULT_API_BASE: &str = "https://iclass.buaa.edu.cn:8346/";
/// Production base for scan-to-sign URLs.
pub const DEFAULT_SIGN_BASE: &str = "http://iclass.buaa.edu.cn:8081/";

pub(crate) const SEMESTER_PATH: &str = "app/course/get_base_school_year.action";
pub(crate) const COURSES_PATH: &str = "app/choosecourse/get_myall_course.action";
pub(crate) const SIGN_DETAIL_PATH: &str = "app/my/get_my_course_sign_detail.action";
pub(crate) const SCAN_SIGN_PATH: &str = "app/course/stu_scan_sign.action";

/// Where the iClass API and the scan-to-sign page live.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub api_base: Url,
    pub sign_base: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: Url::parse(DEFAULT_API_BASE).expect("static URL"),
            sign_base: Url::parse(DEFAULT_SIGN_BASE).expect("static URL"),
        }
    }
}

impl Endpoints {
    /// Endpoints rooted at `api_base` and `sign_base`. A missing trailing `/`
    /// is added so relative paths join under the base rather than beside it.
    pub fn new(api_base: &str, sign_base: &str) -> Result<Self> {
        Ok(Self {
            api_base: parse_base(api_base)?,
            sign_base: parse_base(sign_base)?,
        })
    }

    pub(crate) fn api(&self, path: &str) -> Result<Url> {
        self.api_base
            .join(path)
            .map_err(|e| AppError::InvalidUrl(format!("{path}: {e}")))
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|e| AppError::InvalidUrl(format!("{raw}: {e}")))
}
