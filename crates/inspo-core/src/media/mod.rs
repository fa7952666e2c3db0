//! Attachment pipeline: hand raw files to a media host and turn the returned
//! URLs into [`Attachment`] records.
//!
//! A batch never aborts on a bad file. Each failure is logged and reported
//! back, and every file that did upload is kept, in submission order.

pub mod cloudinary;
pub mod local;

pub use cloudinary::CloudinaryHost;
pub use local::LocalDirHost;

use crate::error::ErrorCode;
use crate::ids;
use crate::model::{Attachment, AttachmentKind};
use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Original file name, kept as the attachment's display name.
    pub name: String,
    /// Declared media type, e.g. `image/png`.
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// Read a file from disk, guessing its media type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = fs::read(path).map_err(|source| UploadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self {
            name,
            media_type,
            bytes,
        })
    }

    #[must_use]
    pub fn kind(&self) -> AttachmentKind {
        AttachmentKind::from_media_type(&self.media_type)
    }
}

/// Failure to get one file onto the media host.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("cannot read {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },

    #[error("media host rejected {name}: {reason}")]
    Rejected { name: String, reason: String },

    #[error("media host unreachable: {0}")]
    Transport(String),

    #[error("media host I/O error: {0}")]
    Io(#[from] io::Error),
}

impl UploadError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Unreadable { .. } => ErrorCode::MediaUnreadable,
            Self::Rejected { .. } => ErrorCode::UploadRejected,
            Self::Transport(_) | Self::Io(_) => ErrorCode::UploadTransport,
        }
    }
}

/// Somewhere files can be uploaded to and fetched from by URL.
pub trait MediaHost {
    /// Upload one file and return a URL that resolves to it.
    fn upload(&self, file: &MediaFile) -> Result<String, UploadError>;
}

/// A file that did not make it into the batch result.
#[derive(Debug)]
pub struct UploadFailure {
    pub name: String,
    pub error: UploadError,
}

/// Outcome of one batch.
#[derive(Debug, Default)]
pub struct UploadReport {
    pub attachments: Vec<Attachment>,
    pub failures: Vec<UploadFailure>,
}

impl UploadReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Record a file that never reached the host, e.g. because it was unreadable.
    pub fn push_failure(&mut self, name: impl Into<String>, error: UploadError) {
        let name = name.into();
        warn!(file = %name, error = %error, "attachment dropped from batch");
        self.failures.push(UploadFailure { name, error });
    }
}

/// Upload `files` one at a time.
pub fn upload_all(host: &dyn MediaHost, files: Vec<MediaFile>) -> UploadReport {
    let mut report = UploadReport::default();
    for file in files {
        match host.upload(&file) {
            Ok(url) => {
                info!(file = %file.name, %url, "attachment uploaded");
                report.attachments.push(Attachment {
                    id: ids::attachment_id(Utc::now()),
                    kind: file.kind(),
                    url,
                    display_name: Some(file.name),
                });
            }
            Err(error) => report.push_failure(file.name, error),
        }
    }
    report
}

/// Read each path and upload what could be read. Unreadable paths are
/// reported as failures alongside rejected uploads.
pub fn upload_paths(host: &dyn MediaHost, paths: &[PathBuf]) -> UploadReport {
    let mut unreadable = Vec::new();
    let mut files = Vec::new();
    for path in paths {
        match MediaFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(error) => unreadable.push((path.display().to_string(), error)),
        }
    }
    let mut report = upload_all(host, files);
    for (name, error) in unreadable {
        report.push_failure(name, error);
    }
    report
}
