//! Turning local files into an analysis request

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lcv_proto::{AnalyseRequest, Document, Image};
use std::path::Path;

/// How a file is attached to the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Pdf,
}

/// Classify a file by its extension
pub fn classify(path: &Path) -> Option<AttachmentKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" | "jpg" | "jpeg" => Some(AttachmentKind::Image),
        "pdf" => Some(AttachmentKind::Pdf),
        _ => None,
    }
}

/// Add one file's bytes to the request under the given kind
pub fn attach(request: &mut AnalyseRequest, kind: AttachmentKind, bytes: &[u8]) {
    let encoded = STANDARD.encode(bytes);
    match kind {
        AttachmentKind::Image => request.images.push(Image::new(encoded)),
        AttachmentKind::Pdf => request.documents.push(Document::new(encoded)),
    }
}

/// Read and encode the given files, skipping unsupported ones
pub fn build_request<P: AsRef<Path>>(paths: &[P]) -> anyhow::Result<AnalyseRequest> {
    let mut request = AnalyseRequest::default();
    for path in paths {
        let path = path.as_ref();
        let Some(kind) = classify(path) else {
            tracing::warn!("Skipping {}: not a PDF, JPG or PNG", path.display());
            continue;
        };
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        tracing::debug!("Attaching {} ({} bytes) as {:?}", path.display(), bytes.len(), kind);
        attach(&mut request, kind, &bytes);
    }
    Ok(request)
}
