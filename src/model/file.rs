//! Locally selected files and their preview handles.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fallback MIME type for content that does not sniff as an image.
const OCTET_STREAM: &str = "application/octet-stream";

/// A file the user picked or dropped, held in memory until submission.
///
/// The content is not validated beyond sniffing a MIME type; deciding whether
/// it is a usable image is left to the detection service.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalFile {
    name: String,
    bytes: Arc<[u8]>,
    mime: &'static str,
    source: Option<PathBuf>,
}

impl LocalFile {
    /// Wrap raw file content.
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let mime = image::guess_format(&bytes)
            .map(|format| format.to_mime_type())
            .unwrap_or(OCTET_STREAM);
        Self {
            name: name.into(),
            bytes,
            mime,
            source: None,
        }
    }

    /// Read a file from disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mut file = Self::new(name, bytes);
        file.source = Some(path.to_path_buf());
        Ok(file)
    }

    /// Original file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file has no content.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Sniffed MIME type, `application/octet-stream` when unknown.
    pub fn mime_type(&self) -> &'static str {
        self.mime
    }

    /// Where the file was read from, when it came from disk.
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .field("mime", &self.mime)
            .finish()
    }
}

/// Displayable handle for a selected file (an object URL in the browser).
///
/// Each live handle pins the file content, so superseded handles must be
/// released through the factory that created them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewUri(String);

impl PreviewUri {
    /// Wrap a URI produced by a preview factory.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The URI as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
