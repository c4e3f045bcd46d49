//! Task file attachments.
//!
//! A task can carry one local file, inlined as a base64 data URI together with
//! its file name. There is no size or type validation. The TUI editor reads the
//! file on a background thread so typing stays responsive; the result arrives
//! once on a channel and is simply dropped if the editor closes first.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::error::{BoardError, Result};
use crate::task::Attachment;

const DEFAULT_MIME: &str = "application/octet-stream";

/// Guess a MIME type from a file extension.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("txt") | Some("log") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        _ => DEFAULT_MIME,
    }
}

/// Encode raw bytes as a data URI.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Decode the payload of a base64 data URI.
pub fn decode_data_uri(url: &str) -> Result<Vec<u8>> {
    let rest = url.strip_prefix("data:").ok_or(BoardError::MalformedDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(BoardError::MalformedDataUri)?;
    if !meta.ends_with(";base64") {
        return Err(BoardError::MalformedDataUri);
    }
    STANDARD
        .decode(payload)
        .map_err(|_| BoardError::MalformedDataUri)
}

/// Read a local file into an attachment record.
pub fn read_attachment(path: &Path) -> Result<Attachment> {
    let bytes = fs::read(path).map_err(|source| BoardError::Attachment {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    debug!(name = %name, bytes = bytes.len(), "read attachment");
    Ok(Attachment {
        url: encode_data_uri(mime_for(path), &bytes),
        name,
    })
}

/// An attachment being read in the background.
pub struct PendingAttachment {
    path: PathBuf,
    rx: Receiver<Result<Attachment>>,
}

impl PendingAttachment {
    /// Start reading `path` on a worker thread.
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker_path = path.clone();
        thread::spawn(move || {
            // The receiver is gone if the editor was closed; nothing to do.
            let _ = tx.send(read_attachment(&worker_path));
        });
        PendingAttachment { path, rx }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The read result, once it is available.
    pub fn poll(&self) -> Option<Result<Attachment>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(BoardError::Attachment {
                path: self.path.clone(),
                source: std::io::Error::other("reader stopped before finishing"),
            })),
        }
    }
}
