//! User-visible notifications for failed scan attempts.

use serde::Serialize;

pub const ACQUIRE_ALERT_TITLE: &str = "Error";
pub const OCR_ALERT_TITLE: &str = "OCR Error";
pub const OCR_ALERT_MESSAGE: &str = "Failed to extract numbers.";

/// Blocking notification naming a generic cause. No error codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}
