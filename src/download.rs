//! Materializing the annotated image as a local file.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::DownloadError;

/// Decode the base64 payload returned by the service.
pub fn decode_annotated(payload: &str) -> Result<Vec<u8>, DownloadError> {
    let bytes = STANDARD.decode(payload.trim())?;
    if image::guess_format(&bytes).ok() != Some(image::ImageFormat::Jpeg) {
        log::warn!(
            "⚠️ Annotated image ({} bytes) does not look like a JPEG, saving anyway",
            bytes.len()
        );
    }
    Ok(bytes)
}

/// Inline `data:` URI carrying `bytes`.
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Saves artifacts into a directory on disk.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FsArtifactSink {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FsArtifactSink {
    /// Save into `dir`, created on first use.
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl crate::platform::ArtifactSink for FsArtifactSink {
    fn save(&self, file_name: &str, _mime_type: &str, bytes: &[u8]) -> Result<String, DownloadError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;
        log::info!("💾 Saved {} bytes to {:?}", bytes.len(), path);
        Ok(path.display().to_string())
    }
}
