//! Result presentation.
//!
//! Turns a detection result and the current threshold into display strings.
//! Front ends only place these strings; all formatting rules live here.

use std::fmt;

use crate::constants::{ANNOTATED_MIME, messages};
use crate::model::number::to_fixed;
use crate::model::{ConfidenceThreshold, Detection, DetectionResult};
use crate::session::Session;

/// One row of the detection table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionRow {
    /// Class label
    pub class_name: String,
    /// Confidence with three decimals
    pub confidence: String,
    /// Rounded corner coordinates, comma separated
    pub bbox: String,
}

impl From<&Detection> for DetectionRow {
    fn from(detection: &Detection) -> Self {
        Self {
            class_name: detection.class_name.clone(),
            confidence: to_fixed(detection.confidence, 3),
            bbox: detection.bounding_box.to_display_string(),
        }
    }
}

/// The detection table, present only once a result exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionTable {
    /// Rows in service order
    pub rows: Vec<DetectionRow>,
}

impl DetectionTable {
    /// Column headers.
    pub const HEADERS: [&'static str; 3] = ["Class", "Conf.", "BBox"];

    /// Text of the empty-state row, if the table has no detections.
    pub fn empty_state(&self) -> Option<&'static str> {
        self.rows.is_empty().then_some(messages::NO_DETECTIONS)
    }
}

/// Annotated output panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotatedView {
    /// Image to show, as a data URI
    Image {
        /// `data:image/jpeg;base64,...`
        data_uri: String,
    },
    /// Message shown instead of an image
    Placeholder(&'static str),
}

/// Everything a front end needs to draw the result area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    /// Detection table, `None` before any result
    pub table: Option<DetectionTable>,
    /// Number of detections, 0 without a result
    pub detected: usize,
    /// Threshold readout with two decimals
    pub threshold: String,
    /// Annotated image or placeholder
    pub annotated: AnnotatedView,
    /// Compact `class pct%` labels
    pub badges: Vec<String>,
}

impl ResultView {
    /// e.g. `3 detected`.
    pub fn detected_label(&self) -> String {
        format!("{} detected", self.detected)
    }

    /// e.g. `Confidence threshold: 0.25`.
    pub fn threshold_label(&self) -> String {
        format!("Confidence threshold: {}", self.threshold)
    }
}

/// Build the view for a result and threshold.
pub fn present(result: Option<&DetectionResult>, threshold: ConfidenceThreshold) -> ResultView {
    let table = result.map(|r| DetectionTable {
        rows: r.predictions.iter().map(DetectionRow::from).collect(),
    });

    let annotated = match result.and_then(DetectionResult::annotated_image) {
        Some(base64) => AnnotatedView::Image {
            data_uri: format!("data:{};base64,{}", ANNOTATED_MIME, base64),
        },
        None => AnnotatedView::Placeholder(messages::NO_ANNOTATED_IMAGE),
    };

    let badges = result
        .map(|r| r.predictions.iter().map(badge).collect())
        .unwrap_or_default();

    ResultView {
        table,
        detected: result.map_or(0, DetectionResult::len),
        threshold: threshold.readout(),
        annotated,
        badges,
    }
}

/// Build the view for a session.
pub fn present_session(session: &Session) -> ResultView {
    present(session.detection_result(), session.confidence_threshold())
}

/// Label of the submit button.
pub fn submit_label(session: &Session) -> &'static str {
    if session.is_submitting() {
        messages::SUBMIT_BUSY
    } else {
        messages::SUBMIT_IDLE
    }
}

fn badge(detection: &Detection) -> String {
    format!(
        "{} {}%",
        detection.class_name,
        to_fixed(detection.confidence * 100.0, 0)
    )
}

impl fmt::Display for ResultView {
    /// Plain-text rendering for terminals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} | {}", self.detected_label(), self.threshold_label())?;

        let Some(table) = &self.table else {
            return Ok(());
        };

        let [class_h, conf_h, bbox_h] = DetectionTable::HEADERS;
        let class_w = table
            .rows
            .iter()
            .map(|r| r.class_name.chars().count())
            .chain(std::iter::once(class_h.len()))
            .max()
            .unwrap_or(0);
        let conf_w = conf_h.len().max(5);

        writeln!(f, "{:<class_w$}  {:<conf_w$}  {}", class_h, conf_h, bbox_h)?;
        if let Some(empty) = table.empty_state() {
            writeln!(f, "{}", empty)?;
        }
        for row in &table.rows {
            writeln!(
                f,
                "{:<class_w$}  {:<conf_w$}  {}",
                row.class_name, row.confidence, row.bbox
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn helmet() -> Detection {
        Detection::new("helmet", 0.8234, BoundingBox::new(10.2, 20.7, 110.4, 210.9))
    }

    #[test]
    fn test_no_result() {
        let view = present(None, ConfidenceThreshold::default());
        assert!(view.table.is_none());
        assert_eq!(view.detected, 0);
        assert_eq!(view.detected_label(), "0 detected");
        assert_eq!(view.threshold_label(), "Confidence threshold: 0.25");
        assert_eq!(
            view.annotated,
            AnnotatedView::Placeholder(messages::NO_ANNOTATED_IMAGE)
        );
        assert!(view.badges.is_empty());
    }

    #[test]
    fn test_empty_predictions_show_empty_state() {
        let result = DetectionResult::new(Vec::new(), None);
        let view = present(Some(&result), ConfidenceThreshold::default());

        let table = view.table.as_ref().unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.empty_state(), Some("No detections"));
        assert_eq!(view.detected, 0);
    }

    #[test]
    fn test_helmet_row_formatting() {
        let result = DetectionResult::new(vec![helmet()], Some("aGVsbG8=".to_string()));
        let view = present(Some(&result), ConfidenceThreshold::new(0.3));

        let table = view.table.as_ref().unwrap();
        assert_eq!(table.empty_state(), None);
        assert_eq!(
            table.rows,
            vec![DetectionRow {
                class_name: "helmet".to_string(),
                confidence: "0.823".to_string(),
                bbox: "10, 21, 110, 211".to_string(),
            }]
        );
        assert_eq!(view.detected, 1);
        assert_eq!(view.threshold, "0.30");
        assert_eq!(view.badges, vec!["helmet 82%".to_string()]);
        assert_eq!(
            view.annotated,
            AnnotatedView::Image {
                data_uri: "data:image/jpeg;base64,aGVsbG8=".to_string()
            }
        );
    }

    #[test]
    fn test_exact_ties_round_up() {
        let tie = Detection::new("vest", 0.0625, BoundingBox::new(0.5, 0.49999999999999994, 1.5, 2.0));
        let result = DetectionResult::new(vec![tie], None);
        let view = present(Some(&result), ConfidenceThreshold::new(0.125));

        let row = &view.table.as_ref().unwrap().rows[0];
        assert_eq!(row.confidence, "0.063");
        assert_eq!(row.bbox, "1, 0, 2, 2");
        assert_eq!(view.threshold, "0.13");
        assert_eq!(view.badges, vec!["vest 6%".to_string()]);
    }

    #[test]
    fn test_text_rendering() {
        let result = DetectionResult::new(vec![helmet()], None);
        let text = present(Some(&result), ConfidenceThreshold::default()).to_string();

        assert!(text.starts_with("1 detected | Confidence threshold: 0.25\n"));
        assert!(text.contains("helmet  0.823  10, 21, 110, 211"));

        let empty = DetectionResult::new(Vec::new(), None);
        let text = present(Some(&empty), ConfidenceThreshold::default()).to_string();
        assert!(text.contains("No detections"));
    }

    #[test]
    fn test_submit_label_follows_gate() {
        let mut session = Session::new();
        assert_eq!(submit_label(&session), "Upload & Predict");

        session.select_file(
            crate::model::LocalFile::new("a.jpg", vec![1, 2, 3]),
            crate::model::PreviewUri::new("blob:1"),
        );
        session.begin_submit().unwrap();
        assert_eq!(submit_label(&session), "Processing...");
    }
}
