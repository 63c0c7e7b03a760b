//! digit-scan: photo → OCR → editable digits.
//!
//! This is the app shell that wires the domains together. No business
//! logic lives here, only module declarations and startup.
//!
//! Domains:
//!   - capture/               acquisition collaborator (camera, gallery)
//!   - ocr/                   recognition collaborator (external engine)
//!   - extract.rs             digit runs from recognized text
//!   - session/               Idle → Recognizing → Ready state machine
//!   - commands.rs            terminal front end

pub mod capture;
pub mod commands;
pub mod config;
pub mod extract;
pub mod ocr;
mod process;
pub mod session;

pub use capture::{AcquireError, Acquirer, ImageReference, ImageSource};
pub use config::ScanConfig;
pub use extract::{extract_digits, ExtractedDigits, NoDigitsPolicy};
pub use ocr::{RecognitionError, RecognitionResult, Recognizer};
pub use process::ProcessError;
pub use session::{Alert, Phase, ScanError, ScanOutcome, ScanSession, ScanSnapshot};

/// Entry point, called by the binary.
pub fn run() -> std::io::Result<()> {
    // Load .env.local → .env from the working directory.
    'env_load: for env_file in [".env.local", ".env"] {
        let path = std::path::Path::new(env_file);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break 'env_load;
        }
    }

    env_logger::init();
    log::info!("digit-scan starting up");

    let config = ScanConfig::load();
    log::info!(
        "[CONFIG] OCR: {:?}, timeout {}ms, camera: {:?}",
        config.ocr_command,
        config.recognition_timeout_ms,
        config.camera_command
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(commands::run_terminal(config))
}
