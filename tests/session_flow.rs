//! State machine tests for a scan session with scripted collaborators.
//!
//! The acquirer hands out paths from a queue; the recognizer answers per
//! path with text, a failure, or a delay. No processes or files involved.

use digit_scan_lib::session::{OCR_ALERT_MESSAGE, OCR_ALERT_TITLE};
use digit_scan_lib::{
    AcquireError, Acquirer, ImageReference, ImageSource, NoDigitsPolicy, Phase, RecognitionError,
    RecognitionResult, Recognizer, ScanError, ScanOutcome, ScanSession, ScanSnapshot,
};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct ScriptedAcquirer {
    queue: Mutex<VecDeque<Result<PathBuf, AcquireError>>>,
}

impl ScriptedAcquirer {
    fn new(steps: Vec<Result<&str, AcquireError>>) -> Self {
        Self {
            queue: Mutex::new(steps.into_iter().map(|s| s.map(PathBuf::from)).collect()),
        }
    }
}

impl Acquirer for ScriptedAcquirer {
    async fn acquire(&self, source: ImageSource) -> Result<ImageReference, AcquireError> {
        let step = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AcquireError::Cancelled));
        step.map(|path| ImageReference::new(path, source))
    }
}

#[derive(Clone)]
enum Reply {
    Text(Vec<&'static str>),
    Fail,
    Slow(Duration, Vec<&'static str>),
}

struct ScriptedRecognizer {
    replies: HashMap<PathBuf, Reply>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    fn new(replies: Vec<(&str, Reply)>) -> Self {
        Self {
            replies: replies
                .into_iter()
                .map(|(path, reply)| (PathBuf::from(path), reply))
                .collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Recognizer for ScriptedRecognizer {
    async fn recognize(&self, image: &ImageReference) -> Result<RecognitionResult, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.get(&image.path).cloned().unwrap_or(Reply::Fail);
        match reply {
            Reply::Text(segments) => Ok(RecognitionResult::from_segments(segments)),
            Reply::Fail => Err(RecognitionError::Failed {
                status: "exit status: 1".to_string(),
                stderr: "model not loaded".to_string(),
            }),
            Reply::Slow(delay, segments) => {
                tokio::time::sleep(delay).await;
                Ok(RecognitionResult::from_segments(segments))
            }
        }
    }
}

fn session(
    steps: Vec<Result<&str, AcquireError>>,
    replies: Vec<(&str, Reply)>,
) -> ScanSession<ScriptedAcquirer, ScriptedRecognizer> {
    ScanSession::new(ScriptedAcquirer::new(steps), ScriptedRecognizer::new(replies))
}

fn ready(outcome: ScanOutcome) -> ScanSnapshot {
    match outcome {
        ScanOutcome::Ready(snapshot) => snapshot,
        other => panic!("expected Ready, got {:?}", other),
    }
}

#[tokio::test]
async fn recognition_seeds_edited_with_extracted() {
    let s = session(
        vec![Ok("a.png")],
        vec![("a.png", Reply::Text(vec!["abc12", "34de56"]))],
    );

    let snap = ready(s.select_image(ImageSource::Gallery).await.unwrap());
    assert_eq!(snap.phase, Phase::Ready);
    assert_eq!(snap.extracted_text(), "12 34 56");
    assert_eq!(snap.edited_text(), "12 34 56");
    assert_eq!(snap.image.as_ref().unwrap().path, PathBuf::from("a.png"));
    assert_eq!(s.snapshot(), snap);
}

#[tokio::test]
async fn invoice_text_yields_digit_runs() {
    let s = session(
        vec![Ok("invoice.jpg")],
        vec![("invoice.jpg", Reply::Text(vec!["Invoice #4412 total $89.50"]))],
    );
    let snap = ready(s.select_image(ImageSource::Camera).await.unwrap());
    assert_eq!(snap.edited_text(), "4412 89 50");
    assert_eq!(snap.image.unwrap().source, ImageSource::Camera);
}

#[tokio::test]
async fn cancelled_acquisition_changes_nothing() {
    let recognizer = ScriptedRecognizer::new(vec![("a.png", Reply::Text(vec!["7"]))]);
    let calls = Arc::clone(&recognizer.calls);
    let s = ScanSession::new(
        ScriptedAcquirer::new(vec![
            Err(AcquireError::Cancelled),
            Ok("a.png"),
            Err(AcquireError::Cancelled),
        ]),
        recognizer,
    );

    // From Idle
    let before = s.snapshot();
    assert_eq!(s.select_image(ImageSource::Gallery).await.unwrap(), ScanOutcome::Cancelled);
    assert_eq!(s.snapshot(), before);

    // From Ready, after an edit
    s.select_image(ImageSource::Gallery).await.unwrap();
    s.edit("70").unwrap();
    let before = s.snapshot();
    assert_eq!(s.select_image(ImageSource::Camera).await.unwrap(), ScanOutcome::Cancelled);
    assert_eq!(s.snapshot(), before);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn acquisition_error_alerts_and_stays_idle() {
    let s = session(
        vec![
            Err(AcquireError::NoImage),
            Err(AcquireError::Command {
                message: String::new(),
            }),
        ],
        vec![],
    );

    let err = s.select_image(ImageSource::Gallery).await.unwrap_err();
    let alert = err.alert().unwrap();
    assert_eq!(alert.title, "Error");
    assert_eq!(alert.message, "No image selected.");
    assert_eq!(s.snapshot(), ScanSnapshot::default());

    let err = s.select_image(ImageSource::Camera).await.unwrap_err();
    assert_eq!(err.alert().unwrap().message, "Something went wrong.");
    assert_eq!(s.phase(), Phase::Idle);
}

#[tokio::test]
async fn recognition_error_alerts_and_returns_to_idle() {
    let s = session(vec![Ok("blurry.png")], vec![("blurry.png", Reply::Fail)]);

    let err = s.select_image(ImageSource::Gallery).await.unwrap_err();
    assert!(matches!(err, ScanError::Recognition(RecognitionError::Failed { .. })));
    let alert = err.alert().unwrap();
    assert_eq!(alert.title, OCR_ALERT_TITLE);
    assert_eq!(alert.message, OCR_ALERT_MESSAGE);
    assert_eq!(s.snapshot(), ScanSnapshot::default());
}

#[tokio::test]
async fn recognition_times_out() {
    let s = session(
        vec![Ok("hang.png")],
        vec![("hang.png", Reply::Slow(Duration::from_secs(30), vec!["1"]))],
    )
    .with_recognition_timeout(Duration::from_millis(50));

    let err = s.select_image(ImageSource::Gallery).await.unwrap_err();
    assert!(matches!(err, ScanError::Recognition(RecognitionError::TimedOut(_))));
    assert_eq!(err.alert().unwrap().title, OCR_ALERT_TITLE);
    assert_eq!(s.snapshot(), ScanSnapshot::default());
}

#[tokio::test]
async fn edit_touches_only_edited_value() {
    let s = session(vec![Ok("a.png")], vec![("a.png", Reply::Text(vec!["12 ab 34"]))]);
    let seeded = ready(s.select_image(ImageSource::Gallery).await.unwrap());

    s.edit("1234, not validated!").unwrap();
    let snap = s.snapshot();
    assert_eq!(snap.phase, Phase::Ready);
    assert_eq!(snap.edited_text(), "1234, not validated!");
    assert_eq!(snap.extracted, seeded.extracted);
    assert_eq!(snap.image, seeded.image);
    assert!(snap.is_modified());

    s.edit("").unwrap();
    assert_eq!(s.snapshot().edited_text(), "");
}

#[tokio::test]
async fn edit_requires_editable_result() {
    let s = session(vec![Ok("words.png")], vec![("words.png", Reply::Text(vec!["no digits"]))]);
    assert!(matches!(s.edit("1"), Err(ScanError::NotReady)));

    // Ready, but nothing extracted: the field is hidden.
    let snap = ready(s.select_image(ImageSource::Gallery).await.unwrap());
    assert!(snap.extracted.as_ref().unwrap().is_empty());
    assert_eq!(snap.edited, None);
    assert!(matches!(s.edit("1"), Err(ScanError::NotReady)));
    assert!(ScanError::NotReady.alert().is_none());
}

#[tokio::test]
async fn fallback_policy_fills_result_field() {
    let s = session(vec![Ok("words.png")], vec![("words.png", Reply::Text(vec!["hello"]))])
        .with_policy(NoDigitsPolicy::fallback_message());

    let snap = ready(s.select_image(ImageSource::Gallery).await.unwrap());
    assert_eq!(snap.extracted_text(), "No numbers found");
    assert_eq!(snap.edited_text(), "No numbers found");
    assert!(snap.extracted.unwrap().is_fallback());
}

#[tokio::test]
async fn remove_image_clears_everything() {
    let s = session(vec![Ok("a.png")], vec![("a.png", Reply::Text(vec!["5"]))]);

    s.remove_image();
    assert_eq!(s.snapshot(), ScanSnapshot::default());

    s.select_image(ImageSource::Gallery).await.unwrap();
    s.edit("55").unwrap();
    s.remove_image();
    let snap = s.snapshot();
    assert_eq!(snap, ScanSnapshot::default());
    assert_eq!(snap.image, None);
    assert_eq!(snap.extracted_text(), "");
    assert_eq!(snap.edited_text(), "");
}

#[tokio::test]
async fn new_scan_overwrites_edited_wholesale() {
    let s = session(
        vec![Ok("a.png"), Ok("b.png")],
        vec![
            ("a.png", Reply::Text(vec!["111"])),
            ("b.png", Reply::Text(vec!["222 333"])),
        ],
    );

    s.select_image(ImageSource::Gallery).await.unwrap();
    s.edit("111 999").unwrap();

    let snap = ready(s.select_image(ImageSource::Gallery).await.unwrap());
    assert_eq!(snap.extracted_text(), "222 333");
    assert_eq!(snap.edited_text(), "222 333");
    assert_eq!(snap.image.unwrap().path, PathBuf::from("b.png"));
}

#[tokio::test]
async fn newer_image_supersedes_pending_recognition() {
    let s = session(
        vec![Ok("slow.png"), Ok("fast.png")],
        vec![
            ("slow.png", Reply::Slow(Duration::from_secs(30), vec!["1"])),
            ("fast.png", Reply::Text(vec!["42"])),
        ],
    );

    let (first, second) = tokio::join!(
        s.select_image(ImageSource::Gallery),
        s.select_image(ImageSource::Gallery)
    );
    assert_eq!(first.unwrap(), ScanOutcome::Superseded);
    let snap = ready(second.unwrap());
    assert_eq!(snap.edited_text(), "42");
    assert_eq!(s.snapshot(), snap);
}

#[tokio::test]
async fn remove_during_recognition_discards_result() {
    let s = session(
        vec![Ok("slow.png")],
        vec![("slow.png", Reply::Slow(Duration::from_millis(500), vec!["9"]))],
    );

    let (outcome, ()) = tokio::join!(s.select_image(ImageSource::Gallery), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(s.phase(), Phase::Recognizing);
        s.remove_image();
    });
    assert_eq!(outcome.unwrap(), ScanOutcome::Superseded);
    assert_eq!(s.snapshot(), ScanSnapshot::default());
}

#[tokio::test]
async fn dropping_scan_mid_recognition_resets_to_idle() {
    let s = session(
        vec![Ok("slow.png"), Ok("a.png")],
        vec![
            ("slow.png", Reply::Slow(Duration::from_secs(30), vec!["1"])),
            ("a.png", Reply::Text(vec!["8"])),
        ],
    );

    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), s.select_image(ImageSource::Gallery)).await;
    assert!(abandoned.is_err());
    assert_eq!(s.snapshot(), ScanSnapshot::default());

    // The session is still usable afterwards.
    let snap = ready(s.select_image(ImageSource::Gallery).await.unwrap());
    assert_eq!(snap.edited_text(), "8");
}

#[tokio::test]
async fn editable_iff_extracted_non_empty() {
    let s = session(
        vec![Ok("a.png"), Ok("b.png"), Ok("c.png")],
        vec![
            ("a.png", Reply::Text(vec!["x1"])),
            ("b.png", Reply::Text(vec!["none"])),
            ("c.png", Reply::Fail),
        ],
    );

    let check = |snap: &ScanSnapshot| {
        let non_empty = snap.extracted.as_ref().is_some_and(|d| !d.is_empty());
        assert_eq!(snap.is_editable(), non_empty, "{:?}", snap);
    };

    check(&s.snapshot());
    for _ in 0..3 {
        let _ = s.select_image(ImageSource::Gallery).await;
        check(&s.snapshot());
        let _ = s.edit("edited");
        check(&s.snapshot());
    }
    s.remove_image();
    check(&s.snapshot());
}
