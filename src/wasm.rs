//! Browser front end.
//!
//! Binds the controller to the page in `web/index.html`: every state change
//! redraws the page from the session, and DOM events call back into the
//! controller.

use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, DragEvent, Element, Event, EventTarget, HtmlButtonElement, HtmlElement,
    HtmlImageElement, HtmlInputElement,
};

use crate::config::ClientConfig;
use crate::controller::DetectionController;
use crate::constants::{CONFIDENCE_STEP, MAX_CONFIDENCE, MIN_CONFIDENCE};
use crate::platform::{Feedback, PickSequence};
use crate::presenter::{AnnotatedView, DetectionTable, present_session, submit_label};
use crate::service::HttpDetectionClient;
use crate::session::Session;
use crate::wasm_file::{BlobPreviews, BrowserDownloads, first_file, read_file};

type Controller = DetectionController<HttpDetectionClient>;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let config = ClientConfig::for_browser();
    if let Err(e) = console_log::init_with_level(config.log_level.to_level()) {
        web_sys::console::log_1(&format!("Logger init failed: {}", e).into());
    }
    log::info!("🚀 Objectify starting...");

    if let Err(e) = mount(&config) {
        log::error!("❌ Failed to mount: {:?}", e);
    }
}

fn mount(config: &ClientConfig) -> Result<(), JsValue> {
    let endpoint = config
        .endpoint_url()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    log::info!("🌐 Detection endpoint: {}", endpoint);

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("no document")?;
    let view = Rc::new(DomView::attach(&document)?);

    let controller = Rc::new(DetectionController::new(
        config,
        HttpDetectionClient::new(endpoint),
        Box::new(BlobPreviews),
        Box::new(BrowserDownloads),
        Box::new(DomFeedback { view: view.clone() }),
    ));
    view.render(&controller.session());

    wire_events(&view, &controller)
}

/// Elements of the page the session is drawn into.
struct DomView {
    document: Document,
    file_input: HtmlInputElement,
    drop_zone: Element,
    preview: HtmlElement,
    preview_img: HtmlImageElement,
    preview_name: Element,
    conf_range: HtmlInputElement,
    conf_value: Element,
    reset_btn: HtmlButtonElement,
    submit_btn: HtmlButtonElement,
    clear_btn: HtmlButtonElement,
    download_btn: HtmlButtonElement,
    results: HtmlElement,
    results_body: Element,
    annotated: Element,
    detected_count: Element,
    threshold_label: Element,
    badges: Element,
}

fn by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing element #{}", id)))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("element #{} has the wrong type", id)))
}

impl DomView {
    fn attach(document: &Document) -> Result<Self, JsValue> {
        let conf_range: HtmlInputElement = by_id(document, "conf-range")?;
        conf_range.set_min(&MIN_CONFIDENCE.to_string());
        conf_range.set_max(&MAX_CONFIDENCE.to_string());
        conf_range.set_step(&CONFIDENCE_STEP.to_string());

        Ok(Self {
            document: document.clone(),
            file_input: by_id(document, "file-input")?,
            drop_zone: by_id(document, "drop-zone")?,
            preview: by_id(document, "preview")?,
            preview_img: by_id(document, "preview-img")?,
            preview_name: by_id(document, "preview-name")?,
            conf_range,
            conf_value: by_id(document, "conf-value")?,
            reset_btn: by_id(document, "reset-btn")?,
            submit_btn: by_id(document, "submit-btn")?,
            clear_btn: by_id(document, "clear-btn")?,
            download_btn: by_id(document, "download-btn")?,
            results: by_id(document, "results")?,
            results_body: by_id(document, "results-body")?,
            annotated: by_id(document, "annotated")?,
            detected_count: by_id(document, "detected-count")?,
            threshold_label: by_id(document, "threshold-label")?,
            badges: by_id(document, "badges")?,
        })
    }

    fn render(&self, session: &Session) {
        if let Err(e) = self.try_render(session) {
            log::error!("❌ Render failed: {:?}", e);
        }
    }

    fn try_render(&self, session: &Session) -> Result<(), JsValue> {
        let view = present_session(session);

        match (session.selected_file(), session.preview_uri()) {
            (Some(file), Some(uri)) => {
                self.preview.set_hidden(false);
                self.preview_img.set_src(uri.as_str());
                self.preview_name.set_text_content(Some(file.name()));
            }
            _ => {
                self.preview.set_hidden(true);
                self.preview_img.remove_attribute("src")?;
                self.preview_name.set_text_content(None);
                self.file_input.set_value("");
            }
        }

        self.conf_range.set_value(&view.threshold);
        self.conf_value.set_text_content(Some(&view.threshold));

        self.submit_btn.set_text_content(Some(submit_label(session)));
        self.submit_btn.set_disabled(!session.can_submit());

        self.results.set_hidden(view.table.is_none());
        self.results_body.set_inner_html("");
        if let Some(table) = &view.table {
            self.fill_table(table)?;
        }

        self.annotated.set_inner_html("");
        match &view.annotated {
            AnnotatedView::Image { data_uri } => {
                let img: HtmlImageElement = self.document.create_element("img")?.dyn_into()?;
                img.set_src(data_uri);
                img.set_alt("annotated");
                self.annotated.append_child(&img)?;
            }
            AnnotatedView::Placeholder(text) => {
                let placeholder = self.document.create_element("div")?;
                placeholder.set_class_name("placeholder");
                placeholder.set_text_content(Some(text));
                self.annotated.append_child(&placeholder)?;
            }
        }

        self.detected_count
            .set_text_content(Some(&view.detected_label()));
        self.threshold_label
            .set_text_content(Some(&view.threshold_label()));

        self.badges.set_inner_html("");
        for badge in &view.badges {
            let el = self.document.create_element("div")?;
            el.set_class_name("badge");
            el.set_text_content(Some(badge));
            self.badges.append_child(&el)?;
        }
        Ok(())
    }

    fn fill_table(&self, table: &DetectionTable) -> Result<(), JsValue> {
        if let Some(text) = table.empty_state() {
            let tr = self.document.create_element("tr")?;
            let td = self.document.create_element("td")?;
            td.set_attribute("colspan", "3")?;
            td.set_class_name("muted");
            td.set_text_content(Some(text));
            tr.append_child(&td)?;
            self.results_body.append_child(&tr)?;
            return Ok(());
        }

        for row in &table.rows {
            let tr = self.document.create_element("tr")?;
            for (i, cell) in [&row.class_name, &row.confidence, &row.bbox]
                .into_iter()
                .enumerate()
            {
                let td = self.document.create_element("td")?;
                if i == 0 {
                    td.set_class_name("class-name");
                }
                td.set_text_content(Some(cell));
                tr.append_child(&td)?;
            }
            self.results_body.append_child(&tr)?;
        }
        Ok(())
    }
}

/// Redraws the page and shows notifications as alerts.
struct DomFeedback {
    view: Rc<DomView>,
}

impl Feedback for DomFeedback {
    fn notify(&self, message: &str) {
        let shown = web_sys::window().map(|w| w.alert_with_message(message));
        if !matches!(shown, Some(Ok(()))) {
            log::warn!("⚠️ {}", message);
        }
    }

    fn session_changed(&self, session: &Session) {
        self.view.render(session);
    }
}

fn listen<E, F>(target: &EventTarget, event: &str, mut handler: F) -> Result<(), JsValue>
where
    E: JsCast + 'static,
    F: FnMut(E) + 'static,
{
    let closure = Closure::wrap(Box::new(move |event: Event| match event.dyn_into::<E>() {
        Ok(event) => handler(event),
        Err(e) => log::warn!("⚠️ Unexpected event type: {:?}", e),
    }) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget(); // Handlers live as long as the page
    Ok(())
}

/// Read `file` off the event loop and hand it to the controller, unless a
/// newer pick started while it was being read.
fn select_browser_file(
    controller: &Rc<Controller>,
    picks: &Rc<PickSequence>,
    file: Option<web_sys::File>,
) {
    let Some(file) = file else {
        log::debug!("📂 No file supplied");
        return;
    };
    let ticket = picks.issue();
    let controller = controller.clone();
    let picks = picks.clone();
    wasm_bindgen_futures::spawn_local(async move {
        match read_file(file).await {
            Ok(file) if picks.is_current(ticket) => controller.select_file(Some(file)),
            Ok(file) => log::debug!("📂 Dropping {}, a newer pick superseded it", file.name()),
            Err(e) => log::error!("📂 Failed to read file: {:?}", e),
        }
    });
}

fn wire_events(view: &Rc<DomView>, controller: &Rc<Controller>) -> Result<(), JsValue> {
    let picks = Rc::new(PickSequence::default());

    let (c, p) = (controller.clone(), picks.clone());
    listen(&view.file_input, "change", move |event: Event| {
        let files = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
            .and_then(|input| input.files());
        select_browser_file(&c, &p, first_file(files));
    })?;

    listen(&view.drop_zone, "dragover", |event: DragEvent| {
        event.prevent_default();
        event.stop_propagation();
    })?;

    let (c, p) = (controller.clone(), picks.clone());
    listen(&view.drop_zone, "drop", move |event: DragEvent| {
        event.prevent_default();
        event.stop_propagation();
        let files = event.data_transfer().and_then(|dt| dt.files());
        select_browser_file(&c, &p, first_file(files));
    })?;

    let c = controller.clone();
    let range = view.conf_range.clone();
    listen(&view.conf_range, "input", move |_: Event| {
        match range.value().parse::<f64>() {
            Ok(value) => {
                c.set_confidence_threshold(value);
            }
            Err(_) => log::warn!("🎚️ Ignoring threshold '{}'", range.value()),
        }
    })?;

    let (c, p) = (controller.clone(), picks.clone());
    listen(&view.reset_btn, "click", move |_: Event| {
        // A read still in flight must not bring a file back after reset
        p.issue();
        c.reset();
    })?;

    let c = controller.clone();
    listen(&view.submit_btn, "click", move |_: Event| {
        let c = c.clone();
        wasm_bindgen_futures::spawn_local(async move {
            // Failures have already been reported through the feedback
            let _ = c.submit().await;
        });
    })?;

    let c = controller.clone();
    listen(&view.clear_btn, "click", move |_: Event| c.clear_result())?;

    let c = controller.clone();
    listen(&view.download_btn, "click", move |_: Event| {
        let _ = c.download_annotated();
    })?;

    log::info!("✅ Event handlers attached");
    Ok(())
}

