//! File-backed acquisition: gallery picks a path, camera runs a capture tool.

use super::{AcquireError, Acquirer, ImageReference, ImageSource};
use crate::process::{self, ProcessError};
use std::future::Future;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Asks the user for an image path. `None` means they backed out.
pub trait PathPicker: Send + Sync {
    fn pick(&self) -> impl Future<Output = Option<PathBuf>> + Send;
}

/// Acquirer over the local filesystem.
///
/// The camera command is an argv template; `{output}` is replaced with the
/// path the tool must write to. A tool that exits cleanly without writing
/// the file is treated as a cancelled capture.
pub struct FileAcquirer<P> {
    picker: P,
    camera_command: Option<Vec<String>>,
    capture_dir: PathBuf,
}

impl<P: PathPicker> FileAcquirer<P> {
    pub fn new(picker: P, capture_dir: impl Into<PathBuf>) -> Self {
        Self {
            picker,
            camera_command: None,
            capture_dir: capture_dir.into(),
        }
    }

    pub fn with_camera_command(mut self, command: Option<Vec<String>>) -> Self {
        self.camera_command = command;
        self
    }

    async fn pick_from_gallery(&self) -> Result<ImageReference, AcquireError> {
        let path = self.picker.pick().await.ok_or(AcquireError::Cancelled)?;
        if path.as_os_str().is_empty() {
            return Err(AcquireError::Cancelled);
        }
        inspect(path, ImageSource::Gallery)
    }

    async fn capture_from_camera(&self) -> Result<ImageReference, AcquireError> {
        let template = self
            .camera_command
            .as_deref()
            .ok_or_else(|| AcquireError::Command {
                message: "No camera available".to_string(),
            })?;

        std::fs::create_dir_all(&self.capture_dir).map_err(|source| AcquireError::Io {
            path: self.capture_dir.clone(),
            source,
        })?;
        let output_path = self.capture_dir.join(capture_file_name());
        let argv = process::render_argv(template, "{output}", &output_path);

        let start = std::time::Instant::now();
        let output = process::run(&argv).await.map_err(|e| match e {
            ProcessError::Empty => AcquireError::Command {
                message: "No camera available".to_string(),
            },
            other => AcquireError::Command {
                message: other.to_string(),
            },
        })?;
        log::info!(
            "[CAPTURE] Camera command finished in {}ms: {}",
            start.elapsed().as_millis(),
            output.status
        );

        if !output.status.success() {
            return Err(AcquireError::Command {
                message: process::stderr_summary(&output),
            });
        }
        if !output_path.exists() {
            log::info!("[CAPTURE] No photo written, treating as cancelled");
            return Err(AcquireError::Cancelled);
        }
        inspect(output_path, ImageSource::Camera)
    }
}

impl<P: PathPicker> Acquirer for FileAcquirer<P> {
    async fn acquire(&self, source: ImageSource) -> Result<ImageReference, AcquireError> {
        match source {
            ImageSource::Gallery => self.pick_from_gallery().await,
            ImageSource::Camera => self.capture_from_camera().await,
        }
    }
}

fn capture_file_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("capture-{}.jpg", millis)
}

/// Confirm `path` is a readable image and record its size.
fn inspect(path: PathBuf, source: ImageSource) -> Result<ImageReference, AcquireError> {
    if let Err(err) = std::fs::metadata(&path) {
        return Err(AcquireError::Io { path, source: err });
    }
    match image::image_dimensions(&path) {
        Ok((width, height)) => {
            log::info!(
                "[CAPTURE] {:?} image {} ({}x{})",
                source,
                path.display(),
                width,
                height
            );
            Ok(ImageReference::new(path, source).with_dimensions(width, height))
        }
        Err(e) => Err(AcquireError::Unsupported {
            reason: e.to_string(),
            path,
        }),
    }
}
