//! Scanner configuration persistence.
//!
//! Settings live in `~/.config/digit-scan/config.json` (platform config dir).
//! A missing file means defaults. Environment variables override the file,
//! so a `.env.local` can point at a different OCR engine for development.

use crate::extract::NoDigitsPolicy;
use crate::ocr::DEFAULT_OCR_COMMAND;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_RECOGNITION_TIMEOUT_MS: u64 = 30_000;

const ENV_TIMEOUT: &str = "DIGIT_SCAN_OCR_TIMEOUT_MS";
const ENV_OCR_COMMAND: &str = "DIGIT_SCAN_OCR_COMMAND";
const ENV_CAMERA_COMMAND: &str = "DIGIT_SCAN_CAMERA_COMMAND";
const ENV_NO_DIGITS: &str = "DIGIT_SCAN_NO_DIGITS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub no_digits: NoDigitsPolicy,
    pub recognition_timeout_ms: u64,
    /// OCR engine argv; `{image}` is replaced with the image path.
    pub ocr_command: Vec<String>,
    /// Camera capture argv; `{output}` is replaced with the photo path.
    pub camera_command: Option<Vec<String>>,
    /// Where camera captures are written.
    pub capture_dir: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            no_digits: NoDigitsPolicy::Empty,
            recognition_timeout_ms: DEFAULT_RECOGNITION_TIMEOUT_MS,
            ocr_command: DEFAULT_OCR_COMMAND.iter().map(|s| s.to_string()).collect(),
            camera_command: None,
            capture_dir: default_capture_dir(),
        }
    }
}

fn default_capture_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("digit-scan")
}

/// Full path to the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("digit-scan")
        .join("config.json")
}

fn split_argv(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

impl ScanConfig {
    /// Load from the default location and apply environment overrides.
    ///
    /// Never fails: an unreadable or invalid file falls back to defaults.
    pub fn load() -> Self {
        let path = config_path();
        let config = match Self::load_from(&path) {
            Ok(Some(config)) => {
                log::info!("[CONFIG] Loaded {}", path.display());
                config
            }
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("[CONFIG] {}, using defaults", e);
                Self::default()
            }
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Read a config file. `Ok(None)` when it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Persist as pretty JSON, creating the directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("[CONFIG] Saved {}", path.display());
        Ok(())
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.recognition_timeout_ms = ms,
                _ => log::warn!("[CONFIG] Ignoring {}={:?}", ENV_TIMEOUT, raw),
            }
        }
        if let Some(raw) = lookup(ENV_OCR_COMMAND) {
            let argv = split_argv(&raw);
            if !argv.is_empty() {
                self.ocr_command = argv;
            }
        }
        if let Some(raw) = lookup(ENV_CAMERA_COMMAND) {
            let argv = split_argv(&raw);
            self.camera_command = if argv.is_empty() { None } else { Some(argv) };
        }
        if let Some(raw) = lookup(ENV_NO_DIGITS) {
            let raw = raw.trim();
            self.no_digits = if raw.is_empty() || raw.eq_ignore_ascii_case("empty") {
                NoDigitsPolicy::Empty
            } else {
                NoDigitsPolicy::Fallback(raw.to_string())
            };
        }
        self
    }

    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_millis(self.recognition_timeout_ms)
    }
}
