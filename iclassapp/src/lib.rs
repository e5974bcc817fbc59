//! iClassApp -- what a signed-in iClass user can do.
//!
//! Sits on top of `iclassauth`'s session pair and provides:
//! - **Course listing**: current semester and enrolled courses
//! - **Check-in records**: per-course sign history, newest first
//! - **QR sign URLs**: the scan-to-sign link for a class meeting
//! - **Profile file**: the `config.json` the sign-in tool writes and reads

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod profile;
pub mod qr;

// Re-export key public types at crate root.
pub use api::IclassClient;
pub use config::Endpoints;
pub use error::{AppError, Result};
pub use models::{Course, Semester, SignRecord};
pub use profile::SigninProfile;
