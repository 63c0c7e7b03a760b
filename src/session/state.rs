//! Per-session view state: what the user currently sees and edits.

use crate::capture::ImageReference;
use crate::extract::ExtractedDigits;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// No image, no text.
    #[default]
    Idle,
    /// Image acquired, waiting on the OCR engine.
    Recognizing,
    /// Digits extracted; the edited value is under user control.
    Ready,
}

/// Mutable state held behind the session lock.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScanState {
    pub phase: Phase,
    pub image: Option<ImageReference>,
    pub extracted: Option<ExtractedDigits>,
    pub edited: Option<String>,
}

impl ScanState {
    pub fn recognizing(image: ImageReference) -> Self {
        Self {
            phase: Phase::Recognizing,
            image: Some(image),
            extracted: None,
            edited: None,
        }
    }

    /// Store a fresh extraction. The edited value is reseeded wholesale and
    /// only exists when there is something to show.
    pub fn ready(&mut self, extracted: ExtractedDigits) {
        self.phase = Phase::Ready;
        self.edited = if extracted.is_empty() {
            None
        } else {
            Some(extracted.as_str().to_string())
        };
        self.extracted = Some(extracted);
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            phase: self.phase,
            image: self.image.clone(),
            extracted: self.extracted.clone(),
            edited: self.edited.clone(),
        }
    }
}

/// Read-only copy of the session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSnapshot {
    pub phase: Phase,
    pub image: Option<ImageReference>,
    pub extracted: Option<ExtractedDigits>,
    pub edited: Option<String>,
}

impl ScanSnapshot {
    pub fn extracted_text(&self) -> &str {
        self.extracted.as_ref().map(|d| d.as_str()).unwrap_or_default()
    }

    pub fn edited_text(&self) -> &str {
        self.edited.as_deref().unwrap_or_default()
    }

    /// The edit field is shown only when extraction produced text.
    pub fn is_editable(&self) -> bool {
        self.edited.is_some()
    }

    /// True once the user has changed the seeded value.
    pub fn is_modified(&self) -> bool {
        match (&self.extracted, &self.edited) {
            (Some(extracted), Some(edited)) => extracted.as_str() != edited,
            _ => false,
        }
    }
}
