//! OCR domain: boundary to the text recognition engine.
//!
//! The engine itself is a collaborator; this module only fixes the shape
//! of what goes in (an [`ImageReference`]) and what comes out (ordered
//! text segments). External code should only use the items exported here.

mod command;

pub use command::{CommandRecognizer, DEFAULT_OCR_COMMAND};

use crate::capture::ImageReference;
use crate::process::ProcessError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Ordered text segments recognized in one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognitionResult {
    segments: Vec<String>,
}

impl RecognitionResult {
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// One segment per non-blank line of engine output.
    pub fn from_text(text: &str) -> Self {
        Self::from_segments(
            text.lines()
                .map(str::trim_end)
                .filter(|line| !line.trim().is_empty()),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.segments.iter().map(|s| s.chars().count()).sum()
    }
}

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("OCR engine unavailable: {0}")]
    Engine(#[from] ProcessError),
    #[error("OCR engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("OCR timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
}

/// Turns an image into recognized text.
pub trait Recognizer: Send + Sync {
    fn recognize(
        &self,
        image: &ImageReference,
    ) -> impl Future<Output = Result<RecognitionResult, RecognitionError>> + Send;
}
