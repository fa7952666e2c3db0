use super::{MediaFile, MediaHost, UploadError};
use crate::ids;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Stores uploads in a local directory and hands back `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalDirHost {
    dir: PathBuf,
}

impl LocalDirHost {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Keep a file name safe to use as a path component.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

impl MediaHost for LocalDirHost {
    fn upload(&self, file: &MediaFile) -> Result<String, UploadError> {
        fs::create_dir_all(&self.dir)?;
        let dir = fs::canonicalize(&self.dir)?;
        let stored = dir.join(format!(
            "{}-{}",
            ids::attachment_id(Utc::now()),
            sanitize(&file.name)
        ));
        fs::write(&stored, &file.bytes)?;
        debug!(path = %stored.display(), bytes = file.bytes.len(), "media stored locally");
        Ok(format!("file://{}", stored.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn upload_copies_bytes_and_returns_file_url() {
        let dir = TempDir::new().unwrap();
        let host = LocalDirHost::new(dir.path().join("media"));
        let url = host
            .upload(&MediaFile {
                name: "mood board.png".to_string(),
                media_type: "image/png".to_string(),
                bytes: b"pixels".to_vec(),
            })
            .unwrap();

        let path = url.strip_prefix("file://").unwrap();
        assert!(path.ends_with("-mood_board.png"));
        assert_eq!(fs::read(path).unwrap(), b"pixels");
    }

    #[test]
    fn sanitize_strips_separators_and_leading_dots() {
        assert_eq!(sanitize("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize("..."), "upload");
        assert_eq!(sanitize("clip.mp4"), "clip.mp4");
    }
}
