use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::item::ParseEnumError;

/// Coarse media kind of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    File,
}

impl AttachmentKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::File => "file",
        }
    }

    /// Position in the display order: images first, then videos, then files.
    #[must_use]
    pub const fn display_rank(self) -> u8 {
        match self {
            Self::Image => 0,
            Self::Video => 1,
            Self::File => 2,
        }
    }

    /// Infer the kind from a declared media type such as `image/png`.
    #[must_use]
    pub fn from_media_type(media_type: &str) -> Self {
        let top = media_type
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match top.as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::File,
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for AttachmentKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            "file" => Ok(Self::File),
            _ => Err(ParseEnumError {
                expected: "attachment kind",
                got: s.to_string(),
            }),
        }
    }
}

/// A media file hosted elsewhere and referenced by URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub kind: AttachmentKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "name")]
    pub display_name: Option<String>,
}

impl Attachment {
    /// Label to show for this attachment: its display name, else its URL.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.url)
    }
}

/// Attachments in display order. Relative order within a kind is preserved.
#[must_use]
pub fn sorted_for_display(attachments: &[Attachment]) -> Vec<Attachment> {
    let mut sorted = attachments.to_vec();
    sorted.sort_by_key(|a| a.kind.display_rank());
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(id: &str, kind: AttachmentKind) -> Attachment {
        Attachment {
            id: id.to_string(),
            kind,
            url: format!("https://media.example/{id}"),
            display_name: None,
        }
    }

    #[test]
    fn kind_from_media_type() {
        assert_eq!(AttachmentKind::from_media_type("image/png"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::from_media_type("VIDEO/mp4"), AttachmentKind::Video);
        assert_eq!(AttachmentKind::from_media_type("application/pdf"), AttachmentKind::File);
        assert_eq!(AttachmentKind::from_media_type(""), AttachmentKind::File);
    }

    #[test]
    fn display_order_groups_by_kind_stably() {
        let submitted = vec![
            attachment("v", AttachmentKind::Video),
            attachment("f", AttachmentKind::File),
            attachment("i1", AttachmentKind::Image),
            attachment("i2", AttachmentKind::Image),
        ];
        let ids: Vec<String> = sorted_for_display(&submitted)
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, ["i1", "i2", "v", "f"]);
    }

    #[test]
    fn label_falls_back_to_url() {
        let mut a = attachment("x", AttachmentKind::File);
        assert_eq!(a.label(), "https://media.example/x");
        a.display_name = Some("brief.pdf".to_string());
        assert_eq!(a.label(), "brief.pdf");
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Image".parse::<AttachmentKind>().unwrap(), AttachmentKind::Image);
        assert!("gif".parse::<AttachmentKind>().is_err());
    }
}
