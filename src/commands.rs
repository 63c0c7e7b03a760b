//! Terminal front end: one scan session driven by typed commands.
//!
//! Stands in for the screen. Each line is one user action; alerts are
//! printed as `Title: message`. The gallery picker prompts for a path on
//! the same input stream.

use crate::capture::{FileAcquirer, ImageSource, PathPicker};
use crate::config::ScanConfig;
use crate::ocr::CommandRecognizer;
use crate::session::{Phase, ScanOutcome, ScanSession, ScanSnapshot};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

type InputLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

pub const HELP: &str = "\
Commands:
  camera        take a photo with the configured camera command
  gallery       choose an image file
  edit <text>   replace the extracted numbers
  remove        remove the image and clear the numbers
  show          print the current state
  json          print the current state as JSON
  help          show this help
  quit          exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Select(ImageSource),
    Edit(String),
    Remove,
    Show,
    Json,
    Help,
    Quit,
}

/// Parse one input line. `Ok(None)` for a blank line.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "camera" | "photo" => Command::Select(ImageSource::Camera),
        "gallery" | "pick" => Command::Select(ImageSource::Gallery),
        // Empty text is a valid edit: the user cleared the field.
        "edit" => Command::Edit(rest.to_string()),
        "remove" | "clear" => Command::Remove,
        "show" => Command::Show,
        "json" => Command::Json,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command '{}' (try 'help')", other)),
    };
    Ok(Some(command))
}

/// Render the state the way the screen would show it.
pub fn render(snapshot: &ScanSnapshot) -> String {
    let mut out = String::new();
    match (&snapshot.phase, &snapshot.image) {
        (Phase::Idle, _) | (_, None) => out.push_str("No image. Use 'camera' or 'gallery'."),
        (phase, Some(image)) => {
            out.push_str(&format!("Image: {}", image.path.display()));
            if let Some((w, h)) = image.dimensions {
                out.push_str(&format!(" ({}x{})", w, h));
            }
            if *phase == Phase::Recognizing {
                out.push_str("\nRecognizing...");
            }
        }
    }
    if snapshot.is_editable() {
        out.push_str(&format!("\nExtracted Numbers: {}", snapshot.edited_text()));
        if snapshot.is_modified() {
            out.push_str(&format!(" (edited, was: {})", snapshot.extracted_text()));
        }
    }
    out
}

/// Reads a path from the shared input. Blank line = cancelled.
pub struct PromptPicker {
    input: InputLines,
}

impl PathPicker for PromptPicker {
    async fn pick(&self) -> Option<PathBuf> {
        prompt("Image path (blank to cancel): ");
        let mut lines = self.input.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) if !line.trim().is_empty() => Some(PathBuf::from(line.trim())),
            Ok(_) => None,
            Err(e) => {
                log::warn!("[CAPTURE] Failed to read path: {}", e);
                None
            }
        }
    }
}

fn prompt(text: &str) {
    print!("{}", text);
    let _ = std::io::stdout().flush();
}

/// Run the interactive loop until `quit` or end of input.
pub async fn run_terminal(config: ScanConfig) -> std::io::Result<()> {
    let input: InputLines = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));

    let recognizer = CommandRecognizer::new(config.ocr_command.clone());
    if let Err(e) = recognizer.check_available() {
        log::warn!("[OCR] {}", e);
        println!("Warning: {}", e);
    }
    let acquirer = FileAcquirer::new(
        PromptPicker {
            input: Arc::clone(&input),
        },
        config.capture_dir.clone(),
    )
    .with_camera_command(config.camera_command.clone());
    let session = ScanSession::from_config(acquirer, recognizer, &config);

    println!("{}", HELP);
    loop {
        prompt("> ");
        let line = {
            let mut lines = input.lock().await;
            lines.next_line().await?
        };
        let Some(line) = line else { break };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match command {
            Command::Select(source) => match session.select_image(source).await {
                Ok(ScanOutcome::Ready(snapshot)) => println!("{}", render(&snapshot)),
                Ok(ScanOutcome::Cancelled) | Ok(ScanOutcome::Superseded) => {}
                Err(e) => {
                    if let Some(alert) = e.alert() {
                        println!("{}", alert);
                    }
                }
            },
            Command::Edit(text) => match session.edit(text) {
                Ok(()) => println!("{}", render(&session.snapshot())),
                Err(e) => println!("Cannot edit: {}", e),
            },
            Command::Remove => {
                session.remove_image();
                println!("{}", render(&session.snapshot()));
            }
            Command::Show => println!("{}", render(&session.snapshot())),
            Command::Json => match serde_json::to_string_pretty(&session.snapshot()) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("[SESSION] Snapshot serialization failed: {}", e),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
        }
    }

    log::info!("[SESSION] Terminal closed");
    Ok(())
}
