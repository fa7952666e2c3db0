use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::attachment::Attachment;
use super::comment::Comment;

/// A project card on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub attachments: Vec<Attachment>,
    pub is_done: bool,
    pub comments: Vec<Comment>,
    #[serde(with = "crate::model::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the user when creating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub title: String,
    pub description: String,
    pub attachments: Vec<Attachment>,
}

impl ItemDraft {
    /// Check the create preconditions: a non-blank title and at least one attachment.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.attachments.is_empty() {
            return Err(ValidationError::MissingAttachments);
        }
        Ok(())
    }
}

/// A partial update. Only the fields that are `Some` are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl ItemPatch {
    /// Whether the patch would write nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.attachments.is_none()
            && self.is_done.is_none()
            && self.comments.is_none()
    }

    #[must_use]
    pub fn done(is_done: bool) -> Self {
        Self {
            is_done: Some(is_done),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn comments(comments: Vec<Comment>) -> Self {
        Self {
            comments: Some(comments),
            ..Self::default()
        }
    }
}

/// Whether `typed` authorizes deleting an item titled `title`.
///
/// The match is exact: same case, same whitespace.
#[must_use]
pub fn delete_confirmation_matches(title: &str, typed: &str) -> bool {
    title == typed
}

/// Check comment text before it is posted or saved.
pub fn validate_comment_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyComment);
    }
    Ok(())
}

/// Check that a display name is set before commenting.
pub fn validate_display_name(name: Option<&str>) -> Result<&str, ValidationError> {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name),
        _ => Err(ValidationError::MissingDisplayName),
    }
}

/// Input rejected before it reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("a project needs a title")]
    MissingTitle,
    #[error("a project needs at least one attachment")]
    MissingAttachments,
    #[error("comment text must not be empty")]
    EmptyComment,
    #[error("set a display name before commenting")]
    MissingDisplayName,
}

impl ValidationError {
    /// Machine-readable tag used in CLI error output.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::MissingTitle => "missing_title",
            Self::MissingAttachments => "missing_attachments",
            Self::EmptyComment => "empty_comment",
            Self::MissingDisplayName => "missing_display_name",
        }
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attachment::AttachmentKind;

    fn image() -> Attachment {
        Attachment {
            id: "a1".to_string(),
            kind: AttachmentKind::Image,
            url: "https://media.example/cover.png".to_string(),
            display_name: Some("cover.png".to_string()),
        }
    }

    #[test]
    fn draft_requires_title_and_attachment() {
        let mut draft = ItemDraft {
            title: "  ".to_string(),
            description: String::new(),
            attachments: vec![image()],
        };
        assert_eq!(draft.validate(), Err(ValidationError::MissingTitle));

        draft.title = "Logo Draft".to_string();
        draft.attachments.clear();
        assert_eq!(draft.validate(), Err(ValidationError::MissingAttachments));

        draft.attachments.push(image());
        assert_eq!(draft.validate(), Ok(()));
    }

    #[test]
    fn confirmation_is_case_sensitive() {
        assert!(!delete_confirmation_matches("Launch Plan", "launch plan"));
        assert!(!delete_confirmation_matches("Launch Plan", "Launch Plan "));
        assert!(delete_confirmation_matches("Launch Plan", "Launch Plan"));
    }

    #[test]
    fn patch_serializes_only_present_fields() {
        let json = serde_json::to_value(ItemPatch::done(true)).unwrap();
        assert_eq!(json, serde_json::json!({ "isDone": true }));
        assert!(ItemPatch::default().is_empty());
        assert!(!ItemPatch::comments(Vec::new()).is_empty());
    }

    #[test]
    fn display_name_must_be_non_blank() {
        assert_eq!(
            validate_display_name(Some("   ")),
            Err(ValidationError::MissingDisplayName)
        );
        assert_eq!(validate_display_name(None), Err(ValidationError::MissingDisplayName));
        assert_eq!(validate_display_name(Some(" Ayu ")), Ok("Ayu"));
    }

    #[test]
    fn comment_text_must_be_non_blank() {
        assert_eq!(validate_comment_text("\n\t"), Err(ValidationError::EmptyComment));
        assert_eq!(validate_comment_text("looks good"), Ok(()));
    }
}
