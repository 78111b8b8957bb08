//! Native front end: terminal feedback, file previews and the interactive
//! command loop of `objectify-native`.

use std::cell::Cell;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::constants::messages;
use crate::controller::DetectionController;
use crate::model::{LocalFile, PreviewUri};
use crate::platform::{Feedback, PreviewFactory};
use crate::service::DetectionService;
use crate::session::{Session, SubmitOutcome};

/// Supported image extensions for the file dialog filter
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];

/// Previews for files read from disk: the file's own `file://` URI.
///
/// Nothing is pinned in memory for these, so releasing only logs.
#[derive(Debug, Default)]
pub struct FilePreviews {
    created: Cell<u64>,
}

impl PreviewFactory for FilePreviews {
    fn create(&self, file: &LocalFile) -> PreviewUri {
        let n = self.created.get() + 1;
        self.created.set(n);

        let uri = file
            .source_path()
            .and_then(|path| path.canonicalize().ok())
            .and_then(|path| Url::from_file_path(path).ok())
            .map(|url| url.to_string())
            .unwrap_or_else(|| format!("memory:{}#{}", file.name(), n));
        log::debug!("🖼️ Preview created: {}", uri);
        PreviewUri::new(uri)
    }

    fn release(&self, preview: PreviewUri) {
        log::debug!("🖼️ Preview released: {}", preview);
    }
}

/// Notifications on stderr.
#[derive(Debug, Default)]
pub struct TerminalFeedback;

impl Feedback for TerminalFeedback {
    fn notify(&self, message: &str) {
        eprintln!("⚠️  {}", message);
    }

    fn session_changed(&self, session: &Session) {
        log::trace!(
            "Session: file={:?} submitting={} result={}",
            session.selected_file().map(LocalFile::name),
            session.is_submitting(),
            session.detection_result().is_some()
        );
    }
}

/// Ask the user for an image with the OS file dialog.
pub fn pick_image_file() -> Option<PathBuf> {
    log::info!("📂 Opening file dialog...");
    rfd::FileDialog::new()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
}

/// Read an image from disk, reporting failures through `feedback`.
pub fn load_file(path: &Path, feedback: &dyn Feedback) -> Option<LocalFile> {
    match LocalFile::from_path(path) {
        Ok(file) => Some(file),
        Err(e) => {
            log::error!("📂 Failed to read {:?}: {}", path, e);
            feedback.notify(&format!("Cannot read {}: {}", path.display(), e));
            None
        }
    }
}

/// One line of input in interactive mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Select a file; without a path the file dialog opens
    Open(Option<PathBuf>),
    /// Change the confidence threshold
    Conf(f64),
    /// Submit the selected file
    Submit,
    /// Print the current result view
    Show,
    /// Clear the result
    Clear,
    /// Clear file and result
    Reset,
    /// Save the annotated image
    Download,
    /// Query the service status
    Status,
    /// List commands
    Help,
    /// Leave interactive mode
    Quit,
}

impl Command {
    /// Help text listing every command.
    pub const HELP: &'static str = "\
commands:
  open [PATH]   select an image (file dialog without PATH)
  conf VALUE    set the confidence threshold (0.05 - 0.9)
  submit        send the image for detection
  show          print the detections
  clear         clear the result
  reset         clear image and result
  download      save annotated.jpg
  status        check the detection service
  help          show this help
  quit          exit";

    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "open" | "o" => Command::Open((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "conf" | "c" => {
                let value = rest
                    .parse::<f64>()
                    .map_err(|_| format!("invalid threshold '{}'", rest))?;
                Command::Conf(value)
            }
            "submit" | "s" => Command::Submit,
            "show" => Command::Show,
            "clear" => Command::Clear,
            "reset" | "r" => Command::Reset,
            "download" | "d" => Command::Download,
            "status" => Command::Status,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        Ok(Some(command))
    }
}

/// Drive a controller from line-based input until `quit` or end of input.
pub async fn run_interactive<S: DetectionService>(
    controller: &DetectionController<S>,
    feedback: &dyn Feedback,
    input: impl BufRead,
    mut output: impl Write,
) -> std::io::Result<()> {
    writeln!(output, "{}", Command::HELP)?;

    for line in input.lines() {
        let line = line?;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(output, "{}", e)?;
                continue;
            }
        };

        match command {
            Command::Open(path) => {
                let file = path
                    .or_else(pick_image_file)
                    .and_then(|path| load_file(&path, feedback));
                controller.select_file(file);
                if let Some(file) = controller.session().selected_file() {
                    writeln!(output, "selected {} ({} bytes)", file.name(), file.len())?;
                }
            }
            Command::Conf(value) => {
                let effective = controller.set_confidence_threshold(value);
                writeln!(output, "confidence threshold: {}", effective)?;
            }
            Command::Submit => {
                if controller.session().can_submit() {
                    writeln!(output, "{}", messages::SUBMIT_BUSY)?;
                }
                if let Ok(outcome) = controller.submit().await {
                    match outcome {
                        SubmitOutcome::Installed { .. } => write!(output, "{}", controller.view())?,
                        SubmitOutcome::Discarded => writeln!(output, "response discarded")?,
                    }
                }
            }
            Command::Show => write!(output, "{}", controller.view())?,
            Command::Clear => controller.clear_result(),
            Command::Reset => controller.reset(),
            Command::Download => match controller.download_annotated() {
                Ok(Some(location)) => writeln!(output, "saved {}", location)?,
                Ok(None) => writeln!(output, "no annotated image yet")?,
                Err(_) => {}
            },
            Command::Status => match controller.check_service().await {
                Ok(status) => writeln!(
                    output,
                    "service: {} (model: {})",
                    status.status,
                    status.model.as_deref().unwrap_or("unknown")
                )?,
                Err(e) => writeln!(output, "service unreachable: {}", e)?,
            },
            Command::Help => writeln!(output, "{}", Command::HELP)?,
            Command::Quit => break,
        }
        output.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::download::FsArtifactSink;
    use crate::error::ServiceError;
    use crate::model::{BoundingBox, Detection, DetectionResult};
    use crate::service::ServiceStatus;
    use crate::session::SubmitRequest;
    use std::future::Future;

    struct FixedService;

    impl DetectionService for FixedService {
        fn detect(
            &self,
            _request: SubmitRequest,
        ) -> impl Future<Output = Result<DetectionResult, ServiceError>> {
            async {
                Ok(DetectionResult::new(
                    vec![Detection::new("vest", 0.5, BoundingBox::new(1.0, 2.0, 3.0, 4.0))],
                    Some("/9j/4AAQ".to_string()),
                ))
            }
        }

        fn status(&self) -> impl Future<Output = Result<ServiceStatus, ServiceError>> {
            async {
                Ok(ServiceStatus {
                    status: "ok".to_string(),
                    model: None,
                })
            }
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("   "), Ok(None));
        assert_eq!(Command::parse("submit"), Ok(Some(Command::Submit)));
        assert_eq!(Command::parse("conf 0.4"), Ok(Some(Command::Conf(0.4))));
        assert_eq!(
            Command::parse("open /tmp/my image.jpg"),
            Ok(Some(Command::Open(Some(PathBuf::from("/tmp/my image.jpg")))))
        );
        assert_eq!(Command::parse("OPEN"), Ok(Some(Command::Open(None))));
        assert!(Command::parse("conf high").is_err());
        assert!(Command::parse("fly").is_err());
    }

    #[test]
    fn test_file_preview_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let previews = FilePreviews::default();
        let from_disk = previews.create(&LocalFile::from_path(&path).unwrap());
        assert!(from_disk.as_str().starts_with("file://"));
        assert!(from_disk.as_str().ends_with("a.jpg"));

        let in_memory = previews.create(&LocalFile::new("b.jpg", vec![1]));
        assert_eq!(in_memory.as_str(), "memory:b.jpg#2");
    }

    #[test]
    fn test_interactive_session() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("site.jpg");
        std::fs::write(&image, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let controller = DetectionController::new(
            &ClientConfig::default(),
            FixedService,
            Box::new(FilePreviews::default()),
            Box::new(FsArtifactSink::new(dir.path().join("out"))),
            Box::new(TerminalFeedback),
        );

        let script = format!(
            "open {}\nconf 2\nsubmit\ndownload\nstatus\nreset\nshow\nquit\nsubmit\n",
            image.display()
        );
        let mut output = Vec::new();
        pollster::block_on(run_interactive(
            &controller,
            &TerminalFeedback,
            script.as_bytes(),
            &mut output,
        ))
        .unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("selected site.jpg (4 bytes)"));
        assert!(output.contains("confidence threshold: 0.90"));
        assert!(output.contains("Processing..."));
        assert!(output.contains("vest   0.500  1, 2, 3, 4"));
        assert!(output.contains("service: ok (model: unknown)"));
        assert!(output.ends_with("0 detected | Confidence threshold: 0.90\n"));
        assert!(dir.path().join("out").join("annotated.jpg").exists());
    }
}
