//! Image acquisition domain: public API.
//!
//! This module owns the boundary to whatever produces a photo: a camera
//! or a picked file. External code should only use the types exported here.

mod picker;

pub use picker::{FileAcquirer, PathPicker};

use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

/// Where the user asked the image to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageSource {
    Camera,
    Gallery,
}

impl ImageSource {
    pub fn from_camera(use_camera: bool) -> Self {
        if use_camera {
            ImageSource::Camera
        } else {
            ImageSource::Gallery
        }
    }
}

/// Handle to an acquired image. Only the path is needed downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    pub path: PathBuf,
    pub source: ImageSource,
    /// Pixel size, when the header could be read.
    pub dimensions: Option<(u32, u32)>,
}

impl ImageReference {
    pub fn new(path: impl Into<PathBuf>, source: ImageSource) -> Self {
        Self {
            path: path.into(),
            source,
            dimensions: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some((width, height));
        self
    }
}

#[derive(Debug, Error)]
pub enum AcquireError {
    /// The user backed out. Not shown to anyone.
    #[error("acquisition cancelled")]
    Cancelled,
    #[error("no image selected")]
    NoImage,
    #[error("unsupported image {}: {reason}", path.display())]
    Unsupported { path: PathBuf, reason: String },
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failure reported by the capture tool itself.
    #[error("capture failed: {message}")]
    Command { message: String },
}

impl AcquireError {
    /// Text for the alert shown to the user, `None` when nothing is shown.
    pub fn user_message(&self) -> Option<String> {
        match self {
            AcquireError::Cancelled => None,
            AcquireError::NoImage => Some("No image selected.".to_string()),
            AcquireError::Command { message } if !message.is_empty() => Some(message.clone()),
            _ => Some("Something went wrong.".to_string()),
        }
    }
}

/// Produces an image, or reports why it could not.
pub trait Acquirer: Send + Sync {
    fn acquire(
        &self,
        source: ImageSource,
    ) -> impl Future<Output = Result<ImageReference, AcquireError>> + Send;
}
