//! Sign-in profile file (`config.json`).
//!
//! ```json
//! { "loginName": "LN20373001", "courses": ["Calculus:C1", "Physics:P1"] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::Course;

/// Identity used for the identity exchange plus the courses to watch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigninProfile {
    #[serde(rename = "loginName")]
    pub login_name: String,
    /// `"name:id"` entries.
    pub courses: Vec<String>,
}

impl SigninProfile {
    pub fn from_courses(login_name: impl Into<String>, courses: &[Course]) -> Self {
        Self {
            login_name: login_name.into(),
            courses: courses
                .iter()
                .map(|c| format!("{}:{}", c.name, c.id))
                .collect(),
        }
    }

    /// Parse the `"name:id"` entries. The id is whatever follows the last `:`.
    pub fn parsed_courses(&self) -> Result<Vec<Course>> {
        self.courses
            .iter()
            .map(|entry| {
                let (name, id) = entry
                    .rsplit_once(':')
                    .map(|(name, id)| (name.trim(), id.trim()))
                    .filter(|(_, id)| !id.is_empty())
                    .ok_or_else(|| AppError::InvalidProfileEntry(entry.clone()))?;
                Ok(Course {
                    name: name.to_string(),
                    id: id.to_string(),
                })
            })
            .collect()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write as pretty-printed UTF-8 JSON; non-ASCII names stay readable.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!(path = %path.display(), courses = self.courses.len(), "profile written");
        Ok(())
    }
}
