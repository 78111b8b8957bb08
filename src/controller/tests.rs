use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::rc::Rc;

use futures::channel::oneshot;

use super::*;
use crate::model::{BoundingBox, Detection, DetectionResult, PreviewUri};
use crate::session::SubmitRequest;

type Response = Result<DetectionResult, ServiceError>;

/// Service answering from a queue of canned responses.
#[derive(Clone, Default)]
struct ScriptedService {
    responses: Rc<RefCell<VecDeque<Response>>>,
    requests: Rc<RefCell<Vec<SubmitRequest>>>,
}

impl ScriptedService {
    fn respond(&self, response: Response) {
        self.responses.borrow_mut().push_back(response);
    }

    fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl DetectionService for ScriptedService {
    fn detect(&self, request: SubmitRequest) -> impl Future<Output = Response> {
        self.requests.borrow_mut().push(request);
        let response = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ServiceError::Transport("no scripted response".to_string())));
        async move { response }
    }

    fn status(&self) -> impl Future<Output = Result<ServiceStatus, ServiceError>> {
        async {
            Ok(ServiceStatus {
                status: "ok".to_string(),
                model: Some("best.pt".to_string()),
            })
        }
    }
}

/// Service whose answer is held back until the test releases it.
#[derive(Clone, Default)]
struct GatedService {
    gate: Rc<RefCell<Option<oneshot::Receiver<Response>>>>,
    calls: Rc<Cell<usize>>,
}

impl GatedService {
    fn arm(&self) -> oneshot::Sender<Response> {
        let (tx, rx) = oneshot::channel();
        *self.gate.borrow_mut() = Some(rx);
        tx
    }
}

impl DetectionService for GatedService {
    fn detect(&self, _request: SubmitRequest) -> impl Future<Output = Response> {
        self.calls.set(self.calls.get() + 1);
        let gate = self.gate.borrow_mut().take();
        async move {
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(ServiceError::Transport("gate dropped".to_string()))),
                None => Err(ServiceError::Transport("gate not armed".to_string())),
            }
        }
    }

    fn status(&self) -> impl Future<Output = Result<ServiceStatus, ServiceError>> {
        async { Err(ServiceError::Transport("offline".to_string())) }
    }
}

/// Preview factory tracking which handles are alive.
#[derive(Clone, Default)]
struct TrackingPreviews {
    next: Rc<Cell<u32>>,
    live: Rc<RefCell<HashSet<PreviewUri>>>,
    released: Rc<Cell<usize>>,
}

impl PreviewFactory for TrackingPreviews {
    fn create(&self, file: &LocalFile) -> PreviewUri {
        let n = self.next.get() + 1;
        self.next.set(n);
        let preview = PreviewUri::new(format!("blob:{}-{}", file.name(), n));
        self.live.borrow_mut().insert(preview.clone());
        preview
    }

    fn release(&self, preview: PreviewUri) {
        assert!(
            self.live.borrow_mut().remove(&preview),
            "released unknown or already released preview {}",
            preview
        );
        self.released.set(self.released.get() + 1);
    }
}

/// Artifact sink keeping saved files in memory.
#[derive(Clone, Default)]
struct MemorySink {
    saved: Rc<RefCell<Vec<(String, String, Vec<u8>)>>>,
}

impl ArtifactSink for MemorySink {
    fn save(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<String, DownloadError> {
        self.saved
            .borrow_mut()
            .push((file_name.to_string(), mime_type.to_string(), bytes.to_vec()));
        Ok(format!("memory://{}", file_name))
    }
}

/// Feedback recording notifications and redraw requests.
#[derive(Clone, Default)]
struct RecordingFeedback {
    notifications: Rc<RefCell<Vec<String>>>,
    redraws: Rc<RefCell<Vec<bool>>>,
}

impl Feedback for RecordingFeedback {
    fn notify(&self, message: &str) {
        self.notifications.borrow_mut().push(message.to_string());
    }

    fn session_changed(&self, session: &Session) {
        self.redraws.borrow_mut().push(session.is_submitting());
    }
}

struct Harness<S> {
    controller: DetectionController<S>,
    previews: TrackingPreviews,
    sink: MemorySink,
    feedback: RecordingFeedback,
}

fn harness<S: DetectionService>(service: S) -> Harness<S> {
    let previews = TrackingPreviews::default();
    let sink = MemorySink::default();
    let feedback = RecordingFeedback::default();
    let controller = DetectionController::new(
        &ClientConfig::default(),
        service,
        Box::new(previews.clone()),
        Box::new(sink.clone()),
        Box::new(feedback.clone()),
    );
    Harness {
        controller,
        previews,
        sink,
        feedback,
    }
}

fn jpeg(name: &str) -> LocalFile {
    LocalFile::new(name, vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
}

fn helmet_result() -> DetectionResult {
    DetectionResult::new(
        vec![Detection::new(
            "helmet",
            0.8234,
            BoundingBox::new(10.2, 20.7, 110.4, 210.9),
        )],
        Some("/9j/4AAQ".to_string()),
    )
}

#[test]
fn test_preview_follows_last_selection() {
    let h = harness(ScriptedService::default());

    h.controller.select_file(Some(jpeg("a.jpg")));
    assert!(h.controller.session().preview_uri().is_some());

    // Absent input is a silent no-op
    h.controller.select_file(None);
    assert!(h.controller.session().preview_uri().is_some());
    assert_eq!(h.controller.session().selected_file().map(LocalFile::name), Some("a.jpg"));

    h.controller.select_file(Some(jpeg("b.jpg")));
    assert_eq!(h.controller.session().selected_file().map(LocalFile::name), Some("b.jpg"));
    assert!(h.feedback.notifications.borrow().is_empty());
}

#[test]
fn test_exactly_one_live_preview() {
    let h = harness(ScriptedService::default());

    for name in ["a.jpg", "b.jpg", "c.jpg", "d.jpg"] {
        h.controller.select_file(Some(jpeg(name)));
        assert_eq!(h.previews.live.borrow().len(), 1);
    }
    assert_eq!(h.previews.released.get(), 3);

    h.controller.reset();
    assert!(h.previews.live.borrow().is_empty());
    assert_eq!(h.previews.released.get(), 4);
}

#[test]
fn test_drop_releases_preview() {
    let h = harness(ScriptedService::default());
    h.controller.select_file(Some(jpeg("a.jpg")));

    let live = h.previews.live.clone();
    drop(h.controller);
    assert!(live.borrow().is_empty());
}

#[test]
fn test_submit_without_file_notifies_and_sends_nothing() {
    let service = ScriptedService::default();
    let h = harness(service.clone());

    let result = pollster::block_on(h.controller.submit());
    assert_eq!(result, Err(SubmitError::Rejected(SubmitRejection::NoFileSelected)));
    assert_eq!(service.request_count(), 0);
    assert!(!h.controller.session().is_submitting());
    assert_eq!(
        *h.feedback.notifications.borrow(),
        vec!["Choose an image first".to_string()]
    );
    assert!(h.feedback.redraws.borrow().is_empty());
}

#[test]
fn test_submit_success_installs_result() {
    let service = ScriptedService::default();
    service.respond(Ok(helmet_result()));
    let h = harness(service.clone());

    h.controller.select_file(Some(jpeg("site.jpg")));
    h.controller.set_confidence_threshold(0.5);
    let outcome = pollster::block_on(h.controller.submit()).unwrap();

    assert_eq!(outcome, SubmitOutcome::Installed { detections: 1 });
    assert_eq!(h.controller.session().detection_result(), Some(&helmet_result()));
    assert!(!h.controller.session().is_submitting());

    let requests = service.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].file.name(), "site.jpg");
    assert_eq!(requests[0].confidence.value(), 0.5);

    let view = h.controller.view();
    let table = view.table.unwrap();
    assert_eq!(table.rows[0].confidence, "0.823");
    assert_eq!(table.rows[0].bbox, "10, 21, 110, 211");
}

#[test]
fn test_submit_redraws_into_and_out_of_submitting() {
    let service = ScriptedService::default();
    service.respond(Ok(helmet_result()));
    let h = harness(service);

    h.controller.select_file(Some(jpeg("a.jpg")));
    h.feedback.redraws.borrow_mut().clear();
    pollster::block_on(h.controller.submit()).unwrap();

    assert_eq!(*h.feedback.redraws.borrow(), vec![true, false]);
}

#[test]
fn test_empty_predictions() {
    let service = ScriptedService::default();
    service.respond(Ok(DetectionResult::new(Vec::new(), None)));
    let h = harness(service);

    h.controller.select_file(Some(jpeg("empty.jpg")));
    pollster::block_on(h.controller.submit()).unwrap();

    let view = h.controller.view();
    assert_eq!(view.detected, 0);
    assert_eq!(view.table.unwrap().empty_state(), Some("No detections"));
}

#[test]
fn test_failure_keeps_previous_result_and_notifies() {
    let service = ScriptedService::default();
    service.respond(Ok(helmet_result()));
    service.respond(Err(ServiceError::http(500, "Server error")));
    let h = harness(service);

    h.controller.select_file(Some(jpeg("a.jpg")));
    pollster::block_on(h.controller.submit()).unwrap();

    let err = pollster::block_on(h.controller.submit()).unwrap_err();
    assert!(matches!(err, SubmitError::Failed(ServiceError::Http { status: 500, .. })));
    assert_eq!(h.controller.session().detection_result(), Some(&helmet_result()));
    assert!(!h.controller.session().is_submitting());

    let notifications = h.feedback.notifications.borrow();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].contains("Server error"));
}

#[test]
fn test_malformed_response_treated_as_failure() {
    let service = ScriptedService::default();
    service.respond(Err(ServiceError::MalformedResponse("expected value".to_string())));
    let h = harness(service);

    h.controller.select_file(Some(jpeg("a.jpg")));
    let err = pollster::block_on(h.controller.submit()).unwrap_err();

    assert!(matches!(err, SubmitError::Failed(ServiceError::MalformedResponse(_))));
    assert!(h.controller.session().detection_result().is_none());
    assert!(h.feedback.notifications.borrow()[0].starts_with("Upload failed: "));
}

#[test]
fn test_second_submit_rejected_while_in_flight() {
    let service = GatedService::default();
    let release = service.arm();
    let h = harness(service.clone());
    h.controller.select_file(Some(jpeg("a.jpg")));

    pollster::block_on(async {
        let first = h.controller.submit();
        futures::pin_mut!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert!(h.controller.session().is_submitting());

        let second = h.controller.submit().await;
        assert_eq!(second, Err(SubmitError::Rejected(SubmitRejection::AlreadySubmitting)));
        assert_eq!(service.calls.get(), 1);

        release.send(Ok(helmet_result())).unwrap();
        assert_eq!(first.await, Ok(SubmitOutcome::Installed { detections: 1 }));
    });

    assert!(!h.controller.session().is_submitting());
    // The in-flight rejection is not a user-facing error
    assert!(h.feedback.notifications.borrow().is_empty());
}

#[test]
fn test_new_selection_during_flight_discards_response() {
    let service = GatedService::default();
    let release = service.arm();
    let h = harness(service);
    h.controller.select_file(Some(jpeg("a.jpg")));

    pollster::block_on(async {
        let first = h.controller.submit();
        futures::pin_mut!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());

        // UI stays live while the request is outstanding
        h.controller.select_file(Some(jpeg("b.jpg")));
        h.controller.set_confidence_threshold(0.7);

        release.send(Ok(helmet_result())).unwrap();
        assert_eq!(first.await, Ok(SubmitOutcome::Discarded));
    });

    let session = h.controller.session();
    assert!(session.detection_result().is_none());
    assert_eq!(session.selected_file().map(LocalFile::name), Some("b.jpg"));
    assert!(!session.is_submitting());
}

#[test]
fn test_selecting_file_clears_result() {
    let service = ScriptedService::default();
    service.respond(Ok(helmet_result()));
    let h = harness(service);

    h.controller.select_file(Some(jpeg("a.jpg")));
    pollster::block_on(h.controller.submit()).unwrap();
    assert!(h.controller.session().detection_result().is_some());

    h.controller.select_file(Some(jpeg("b.jpg")));
    assert!(h.controller.session().detection_result().is_none());
}

#[test]
fn test_reset_and_clear_result() {
    let service = ScriptedService::default();
    service.respond(Ok(helmet_result()));
    service.respond(Ok(helmet_result()));
    let h = harness(service);

    // Reset on an empty session is safe
    h.controller.reset();

    h.controller.select_file(Some(jpeg("a.jpg")));
    pollster::block_on(h.controller.submit()).unwrap();
    h.controller.clear_result();
    assert!(h.controller.session().detection_result().is_none());
    assert!(h.controller.session().selected_file().is_some());

    pollster::block_on(h.controller.submit()).unwrap();
    h.controller.reset();
    let session = h.controller.session();
    assert!(session.selected_file().is_none());
    assert!(session.preview_uri().is_none());
    assert!(session.detection_result().is_none());
}

#[test]
fn test_threshold_clamped() {
    let h = harness(ScriptedService::default());
    assert_eq!(h.controller.session().confidence_threshold().value(), 0.25);

    assert_eq!(h.controller.set_confidence_threshold(5.0).value(), 0.9);
    assert_eq!(h.controller.set_confidence_threshold(-5.0).value(), 0.05);
    assert_eq!(h.controller.view().threshold, "0.05");
}

#[test]
fn test_download_without_result_is_noop() {
    let h = harness(ScriptedService::default());
    assert_eq!(h.controller.download_annotated().unwrap(), None);
    assert!(h.sink.saved.borrow().is_empty());
}

#[test]
fn test_download_saves_decoded_image() {
    let service = ScriptedService::default();
    service.respond(Ok(helmet_result()));
    let h = harness(service.clone());

    h.controller.select_file(Some(jpeg("a.jpg")));
    pollster::block_on(h.controller.submit()).unwrap();

    let location = h.controller.download_annotated().unwrap();
    assert_eq!(location.as_deref(), Some("memory://annotated.jpg"));

    let saved = h.sink.saved.borrow();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "annotated.jpg");
    assert_eq!(saved[0].1, "image/jpeg");
    assert_eq!(saved[0].2, vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);
    // Downloads never reach the network
    assert_eq!(service.request_count(), 1);
}

#[test]
fn test_download_invalid_payload_notifies() {
    let service = ScriptedService::default();
    service.respond(Ok(DetectionResult::new(Vec::new(), Some("%%%".to_string()))));
    let h = harness(service);

    h.controller.select_file(Some(jpeg("a.jpg")));
    pollster::block_on(h.controller.submit()).unwrap();

    assert!(h.controller.download_annotated().is_err());
    assert!(h.sink.saved.borrow().is_empty());
    assert!(h.feedback.notifications.borrow()[0].starts_with("Download failed: "));
}

#[test]
fn test_check_service_leaves_session_alone() {
    let h = harness(ScriptedService::default());
    h.controller.select_file(Some(jpeg("a.jpg")));

    let status = pollster::block_on(h.controller.check_service()).unwrap();
    assert!(status.is_ok());
    assert!(h.controller.session().selected_file().is_some());

    let offline = harness(GatedService::default());
    assert!(pollster::block_on(offline.controller.check_service()).is_err());
}
