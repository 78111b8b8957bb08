//! WASM file utilities.
//!
//! Reads picked or dropped files, creates object-URL previews and saves the
//! annotated image through a temporary `data:` download link. Uses web_sys to
//! interact with browser APIs.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, File, FileList, HtmlAnchorElement, Url};

use crate::download::data_uri;
use crate::error::DownloadError;
use crate::model::{LocalFile, PreviewUri};
use crate::platform::{ArtifactSink, PreviewFactory};

/// First file of a picker or drop; any further files are ignored.
pub fn first_file(files: Option<FileList>) -> Option<File> {
    let files = files?;
    if files.length() > 1 {
        log::info!("📂 {} files supplied, using the first", files.length());
    }
    files.get(0)
}

/// Read a browser file into memory.
pub async fn read_file(file: File) -> Result<LocalFile, JsValue> {
    let name = file.name();
    let buffer = JsFuture::from(file.array_buffer()).await?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    log::info!("📂 File {} read: {} bytes", name, bytes.len());
    Ok(LocalFile::new(name, bytes))
}

/// Build a `Blob` holding `bytes`.
fn make_blob(bytes: &[u8], mime_type: &str) -> Result<Blob, JsValue> {
    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::of1(&array);
    let options = BlobPropertyBag::new();
    options.set_type(mime_type);
    Blob::new_with_u8_array_sequence_and_options(&parts, &options)
}

/// Previews backed by `URL.createObjectURL`.
#[derive(Debug, Default)]
pub struct BlobPreviews;

impl PreviewFactory for BlobPreviews {
    fn create(&self, file: &LocalFile) -> PreviewUri {
        match make_blob(file.bytes(), file.mime_type())
            .and_then(|blob| Url::create_object_url_with_blob(&blob))
        {
            Ok(url) => PreviewUri::new(url),
            Err(e) => {
                log::warn!("🖼️ Object URL unavailable ({:?}), using data URI", e);
                PreviewUri::new(data_uri(file.mime_type(), file.bytes()))
            }
        }
    }

    fn release(&self, preview: PreviewUri) {
        if preview.as_str().starts_with("blob:") {
            if let Err(e) = Url::revoke_object_url(preview.as_str()) {
                log::warn!("🖼️ Failed to revoke {}: {:?}", preview, e);
            }
        }
    }
}

/// Saves artifacts through the browser's download mechanism.
#[derive(Debug, Default)]
pub struct BrowserDownloads;

impl BrowserDownloads {
    fn download(file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Nothing to revoke, so the click may finish after this returns
        let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
        anchor.set_href(&data_uri(mime_type, bytes));
        anchor.set_download(file_name);
        anchor.click();
        Ok(())
    }
}

impl ArtifactSink for BrowserDownloads {
    fn save(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> Result<String, DownloadError> {
        Self::download(file_name, mime_type, bytes)
            .map_err(|e| DownloadError::Browser(format!("{:?}", e)))?;
        log::info!("💾 Downloaded {} ({} bytes)", file_name, bytes.len());
        Ok(file_name.to_string())
    }
}
