//! Scan session: acquire → OCR → extract digits → editable value.
//!
//! One `ScanSession` per interaction. State transitions:
//!
//! ```text
//! Idle ──acquire ok──▶ Recognizing ──OCR ok──▶ Ready ──edit──▶ Ready
//!   ▲                      │                     │
//!   └──── OCR error ───────┘                     │
//!   └──────────────── remove_image ──────────────┘
//! ```
//!
//! Acquisition and recognition are awaited in sequence. Every successful
//! acquisition starts a new generation; a recognition whose generation is
//! no longer current is dropped and its result never applied.

mod alert;
mod state;

pub use alert::{Alert, ACQUIRE_ALERT_TITLE, OCR_ALERT_MESSAGE, OCR_ALERT_TITLE};
pub use state::{Phase, ScanSnapshot};

use crate::capture::{AcquireError, Acquirer, ImageSource};
use crate::config::ScanConfig;
use crate::extract::{self, NoDigitsPolicy};
use crate::ocr::{RecognitionError, Recognizer};
use state::ScanState;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Acquire(AcquireError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
    /// Editing requires a Ready session with a non-empty result.
    #[error("nothing to edit")]
    NotReady,
}

impl ScanError {
    /// The notification to show, if any.
    pub fn alert(&self) -> Option<Alert> {
        match self {
            ScanError::Acquire(e) => e
                .user_message()
                .map(|message| Alert::new(ACQUIRE_ALERT_TITLE, message)),
            ScanError::Recognition(_) => Some(Alert::new(OCR_ALERT_TITLE, OCR_ALERT_MESSAGE)),
            ScanError::NotReady => None,
        }
    }
}

/// How a `select_image` call ended without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// User backed out of acquisition; nothing changed.
    Cancelled,
    /// Digits extracted and seeded into the edited value.
    Ready(ScanSnapshot),
    /// A newer image or a removal replaced this attempt mid-recognition.
    Superseded,
}

pub struct ScanSession<A, R> {
    acquirer: A,
    recognizer: R,
    policy: NoDigitsPolicy,
    recognition_timeout: Duration,
    state: Mutex<ScanState>,
    generation: watch::Sender<u64>,
}

impl<A, R> ScanSession<A, R> {
    fn lock_state(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Advance the generation. Caller must hold the state lock.
    fn bump_generation(&self) -> u64 {
        let mut next = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            next = *g;
        });
        next
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        self.lock_state().snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.lock_state().phase
    }

    /// Replace the edited value. Extracted digits and the image are untouched.
    pub fn edit(&self, text: impl Into<String>) -> Result<(), ScanError> {
        let mut state = self.lock_state();
        match (state.phase, state.edited.as_mut()) {
            (Phase::Ready, Some(edited)) => {
                *edited = text.into();
                Ok(())
            }
            _ => Err(ScanError::NotReady),
        }
    }

    /// Drop the image and both digit strings; abandon any pending OCR.
    pub fn remove_image(&self) {
        let mut state = self.lock_state();
        self.bump_generation();
        if state.phase != Phase::Idle {
            log::info!("[SESSION] Image removed ({:?} → Idle)", state.phase);
        }
        *state = ScanState::default();
    }
}

impl<A: Acquirer, R: Recognizer> ScanSession<A, R> {
    pub fn new(acquirer: A, recognizer: R) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            acquirer,
            recognizer,
            policy: NoDigitsPolicy::default(),
            recognition_timeout: Duration::from_millis(crate::config::DEFAULT_RECOGNITION_TIMEOUT_MS),
            state: Mutex::new(ScanState::default()),
            generation,
        }
    }

    pub fn from_config(acquirer: A, recognizer: R, config: &ScanConfig) -> Self {
        Self::new(acquirer, recognizer)
            .with_policy(config.no_digits.clone())
            .with_recognition_timeout(config.recognition_timeout())
    }

    pub fn with_policy(mut self, policy: NoDigitsPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_recognition_timeout(mut self, timeout: Duration) -> Self {
        self.recognition_timeout = timeout;
        self
    }

    /// Acquire an image from `source`, recognize it, and seed the edit state.
    ///
    /// Cancellation leaves the session untouched. An acquisition failure
    /// also leaves it untouched and returns an error carrying an alert. A
    /// recognition failure or timeout resets the session to `Idle`.
    ///
    /// Dropping the returned future while recognition is pending resets the
    /// session to `Idle` and kills the OCR engine process.
    pub async fn select_image(&self, source: ImageSource) -> Result<ScanOutcome, ScanError> {
        let image = match self.acquirer.acquire(source).await {
            Ok(image) => image,
            Err(AcquireError::Cancelled) => {
                log::info!("[SESSION] {:?} acquisition cancelled", source);
                return Ok(ScanOutcome::Cancelled);
            }
            Err(e) => {
                log::warn!("[SESSION] {:?} acquisition failed: {}", source, e);
                return Err(ScanError::Acquire(e));
            }
        };

        let generation = {
            let mut state = self.lock_state();
            let generation = self.bump_generation();
            *state = ScanState::recognizing(image.clone());
            generation
        };
        log::info!(
            "[SESSION] Recognizing {} (generation {})",
            image.path.display(),
            generation
        );

        let mut pending = PendingRecognition {
            session: self,
            generation,
            settled: false,
        };
        let mut moved = self.generation.subscribe();
        let start = std::time::Instant::now();

        let result = tokio::select! {
            result = tokio::time::timeout(self.recognition_timeout, self.recognizer.recognize(&image)) => {
                result.unwrap_or_else(|_| Err(RecognitionError::TimedOut(self.recognition_timeout)))
            }
            () = generation_moved(&mut moved, generation) => {
                pending.settled = true;
                log::info!("[SESSION] Generation {} superseded", generation);
                return Ok(ScanOutcome::Superseded);
            }
        };
        let ocr_ms = start.elapsed().as_millis();
        let extracted =
            result.map(|recognized| extract::extract_digits(recognized.segments(), &self.policy));

        let mut state = self.lock_state();
        pending.settled = true;
        if self.current_generation() != generation {
            log::info!("[SESSION] Generation {} superseded", generation);
            return Ok(ScanOutcome::Superseded);
        }

        match extracted {
            Ok(extracted) => {
                log::info!(
                    "[SESSION] Ready in {}ms: {} digit runs",
                    ocr_ms,
                    extracted.run_count()
                );
                state.ready(extracted);
                Ok(ScanOutcome::Ready(state.snapshot()))
            }
            Err(e) => {
                log::error!("[SESSION] Recognition failed after {}ms: {}", ocr_ms, e);
                *state = ScanState::default();
                Err(ScanError::Recognition(e))
            }
        }
    }
}

/// Resets the session if a `select_image` future is dropped mid-recognition.
struct PendingRecognition<'a, A, R> {
    session: &'a ScanSession<A, R>,
    generation: u64,
    settled: bool,
}

impl<A, R> Drop for PendingRecognition<'_, A, R> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.session.lock_state();
        if self.session.current_generation() == self.generation {
            log::info!("[SESSION] Recognition abandoned (generation {})", self.generation);
            self.session.bump_generation();
            *state = ScanState::default();
        }
    }
}

/// Resolves once the generation differs from `generation`.
async fn generation_moved(rx: &mut watch::Receiver<u64>, generation: u64) {
    loop {
        if *rx.borrow_and_update() != generation {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender lives as long as the session; never resolve.
            std::future::pending::<()>().await;
        }
    }
}
