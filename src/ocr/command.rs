//! OCR via an external engine binary (tesseract by default).

use super::{RecognitionError, RecognitionResult, Recognizer};
use crate::capture::ImageReference;
use crate::process;

/// Default engine invocation: plain text to stdout.
pub const DEFAULT_OCR_COMMAND: &[&str] = &["tesseract", "{image}", "stdout"];

/// Runs an argv template with `{image}` replaced by the image path and
/// treats each non-blank stdout line as a segment.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    argv: Vec<String>,
}

impl CommandRecognizer {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Check that the engine binary can be found before the first scan.
    pub fn check_available(&self) -> Result<(), RecognitionError> {
        process::resolve_program(&self.argv)?;
        Ok(())
    }
}

impl Default for CommandRecognizer {
    fn default() -> Self {
        Self::new(DEFAULT_OCR_COMMAND.iter().map(|s| s.to_string()).collect())
    }
}

impl Recognizer for CommandRecognizer {
    async fn recognize(&self, image: &ImageReference) -> Result<RecognitionResult, RecognitionError> {
        let start = std::time::Instant::now();
        let argv = process::render_argv(&self.argv, "{image}", &image.path);
        let output = process::run(&argv).await?;

        if !output.status.success() {
            return Err(RecognitionError::Failed {
                status: output.status.to_string(),
                stderr: process::stderr_summary(&output),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let result = RecognitionResult::from_text(&text);
        log::info!(
            "[OCR] Extracted {} chars in {} segments in {}ms",
            result.char_count(),
            result.segments().len(),
            start.elapsed().as_millis()
        );
        log::debug!("[OCR] preview: {:?}", &text.chars().take(200).collect::<String>());
        Ok(result)
    }
}
