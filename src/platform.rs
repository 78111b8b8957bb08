//! Seams between the controller and the environment it runs in.
//!
//! The browser and native front ends each provide implementations; tests
//! provide recording fakes.

use std::cell::Cell;

use crate::error::DownloadError;
use crate::model::{LocalFile, PreviewUri};
use crate::session::Session;

/// Creates and releases displayable handles for selected files.
pub trait PreviewFactory {
    /// Create a handle for `file`.
    fn create(&self, file: &LocalFile) -> PreviewUri;

    /// Release a handle that is no longer shown.
    fn release(&self, preview: PreviewUri);
}

/// Stores a derived artifact where the user can get at it.
pub trait ArtifactSink {
    /// Save `bytes` under `file_name`. Returns a description of where the
    /// artifact went (a path, or the file name for browser downloads).
    fn save(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<String, DownloadError>;
}

/// User-facing side of the controller.
pub trait Feedback {
    /// Show a notification. May block until dismissed.
    fn notify(&self, message: &str);

    /// Called after every state change so the view can be redrawn.
    fn session_changed(&self, _session: &Session) {}
}

/// Orders asynchronous file reads so only the most recent pick is selected.
///
/// Each pick takes a ticket before its read starts; a read that finishes
/// after a newer ticket was issued is dropped.
#[derive(Debug, Default)]
pub struct PickSequence {
    latest: Cell<u64>,
}

impl PickSequence {
    /// Start a new pick, superseding every earlier one.
    pub fn issue(&self) -> u64 {
        let ticket = self.latest.get() + 1;
        self.latest.set(ticket);
        ticket
    }

    /// Whether no pick was started after `ticket`.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.get() == ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_pick_supersedes_slower_earlier_read() {
        let picks = PickSequence::default();
        let large = picks.issue();
        let small = picks.issue();

        // The second read finishes first and is kept
        assert!(picks.is_current(small));
        // The first read finishing afterwards is dropped
        assert!(!picks.is_current(large));
    }

    #[test]
    fn test_issue_without_read_cancels_pending_pick() {
        let picks = PickSequence::default();
        let pending = picks.issue();
        picks.issue();
        assert!(!picks.is_current(pending));
    }
}
