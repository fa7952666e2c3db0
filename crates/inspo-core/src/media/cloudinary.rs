//! Unsigned uploads to a Cloudinary-style media host.
//!
//! The file travels as a base64 data URI in a form-encoded POST together with
//! an upload preset; the host answers with JSON carrying `secure_url`.

use super::{MediaFile, MediaHost, UploadError};
use crate::model::AttachmentKind;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CloudinaryHost {
    api_base: String,
    cloud_name: String,
    upload_preset: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryHost {
    #[must_use]
    pub fn new(cloud_name: impl Into<String>, upload_preset: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            cloud_name: cloud_name.into(),
            upload_preset: upload_preset.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upload endpoint for a file of `kind`.
    #[must_use]
    pub fn endpoint(&self, kind: AttachmentKind) -> String {
        let resource = match kind {
            AttachmentKind::Image => "image",
            AttachmentKind::Video => "video",
            AttachmentKind::File => "raw",
        };
        format!(
            "{}/{}/{resource}/upload",
            self.api_base.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

fn data_uri(file: &MediaFile) -> String {
    format!("data:{};base64,{}", file.media_type, STANDARD.encode(&file.bytes))
}

fn rejection_reason(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body).map_or_else(
        |_| format!("HTTP {status}"),
        |parsed| format!("HTTP {status}: {}", parsed.error.message),
    )
}

impl MediaHost for CloudinaryHost {
    fn upload(&self, file: &MediaFile) -> Result<String, UploadError> {
        let endpoint = self.endpoint(file.kind());
        debug!(%endpoint, file = %file.name, bytes = file.bytes.len(), "uploading to media host");

        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let payload = data_uri(file);
        let form = [
            ("file", payload.as_str()),
            ("upload_preset", self.upload_preset.as_str()),
        ];

        match agent.post(&endpoint).send_form(&form) {
            Ok(response) => {
                let body: UploadResponse = response.into_json()?;
                body.secure_url
                    .or(body.url)
                    .ok_or_else(|| UploadError::Rejected {
                        name: file.name.clone(),
                        reason: "response carried no URL".to_string(),
                    })
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(UploadError::Rejected {
                    name: file.name.clone(),
                    reason: rejection_reason(status, &body),
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(UploadError::Transport(transport.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tracks_kind() {
        let host = CloudinaryHost::new("dl2ijoilh", "ml_default").with_api_base("https://h.test/v1/");
        assert_eq!(
            host.endpoint(AttachmentKind::Image),
            "https://h.test/v1/dl2ijoilh/image/upload"
        );
        assert_eq!(
            host.endpoint(AttachmentKind::File),
            "https://h.test/v1/dl2ijoilh/raw/upload"
        );
    }

    #[test]
    fn data_uri_embeds_media_type() {
        let file = MediaFile {
            name: "a.png".to_string(),
            media_type: "image/png".to_string(),
            bytes: b"hi".to_vec(),
        };
        assert_eq!(data_uri(&file), "data:image/png;base64,aGk=");
    }

    #[test]
    fn rejection_reason_prefers_host_message() {
        let body = r#"{"error":{"message":"Upload preset not found"}}"#;
        assert_eq!(rejection_reason(400, body), "HTTP 400: Upload preset not found");
        assert_eq!(rejection_reason(502, "<html>"), "HTTP 502");
    }
}
