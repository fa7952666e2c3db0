//! The persisted document shape of one item, and read-time normalization.
//!
//! Documents are camelCase JSON objects keyed by item id:
//! `{ title, description, attachments[], isDone, comments[], createdAt }`.
//! Boards written before attachments existed hold a single `imageUrl`; such
//! records are read back as one image attachment. Attachment entries missing
//! an `id` or `kind` are completed on read; entries without a URL are dropped.

use crate::model::{Attachment, AttachmentKind, Comment, ProjectItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Id given to the attachment synthesized from a legacy `imageUrl`.
pub const LEGACY_IMAGE_ID: &str = "legacy-image";

/// Prefix for ids given to stored attachments that lack one; the entry's
/// position follows.
pub const UNNAMED_ATTACHMENT_PREFIX: &str = "attachment-";

/// One raw document as held by a backend.
pub type Document = Map<String, Value>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewRecord<'a> {
    title: &'a str,
    description: &'a str,
    attachments: &'a [Attachment],
    is_done: bool,
    comments: &'a [Comment],
    #[serde(with = "crate::model::timestamp")]
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    attachments: Option<Vec<Value>>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    is_done: Option<bool>,
    #[serde(default, deserialize_with = "crate::model::timestamp::vec_or_null")]
    comments: Vec<Comment>,
    #[serde(default, deserialize_with = "crate::model::timestamp::deserialize_option")]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAttachment {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, alias = "name")]
    display_name: Option<String>,
}

/// Guess an attachment kind from the extension in its URL.
fn kind_from_url(url: &str) -> AttachmentKind {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    mime_guess::from_path(path)
        .first()
        .map_or(AttachmentKind::File, |mime| {
            AttachmentKind::from_media_type(mime.essence_str())
        })
}

fn decode_attachment(item_id: &str, index: usize, raw: Value) -> Option<Attachment> {
    let stored: StoredAttachment = match serde_json::from_value(raw) {
        Ok(stored) => stored,
        Err(err) => {
            warn!(item = item_id, index, error = %err, "dropping malformed attachment");
            return None;
        }
    };
    let Some(url) = stored.url.filter(|url| !url.trim().is_empty()) else {
        warn!(item = item_id, index, "dropping attachment without a url");
        return None;
    };
    let kind = stored
        .kind
        .and_then(|kind| kind.parse().ok())
        .unwrap_or_else(|| kind_from_url(&url));
    let id = stored
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("{UNNAMED_ATTACHMENT_PREFIX}{index}"));
    Some(Attachment {
        id,
        kind,
        url,
        display_name: stored.display_name,
    })
}

/// Build the document for a freshly created item.
pub fn encode_new(item: &ProjectItem) -> Result<Document, serde_json::Error> {
    let record = NewRecord {
        title: &item.title,
        description: &item.description,
        attachments: &item.attachments,
        is_done: item.is_done,
        comments: &item.comments,
        created_at: item.created_at,
    };
    into_document(serde_json::to_value(record)?)
}

/// Turn any serializable value that encodes as a JSON object into a [`Document`].
pub fn into_document(value: Value) -> Result<Document, serde_json::Error> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(serde::de::Error::custom(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Decode a stored document into an item, applying legacy normalization.
pub fn decode(id: &str, doc: &Document) -> Result<ProjectItem, serde_json::Error> {
    let record: StoredRecord = serde_json::from_value(Value::Object(doc.clone()))?;

    let attachments: Vec<Attachment> = record
        .attachments
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| decode_attachment(id, index, raw))
        .collect();
    let attachments = match record.image_url {
        Some(url) if attachments.is_empty() && !url.trim().is_empty() => vec![Attachment {
            id: LEGACY_IMAGE_ID.to_string(),
            kind: AttachmentKind::Image,
            url,
            display_name: None,
        }],
        _ => attachments,
    };

    Ok(ProjectItem {
        id: id.to_string(),
        title: record.title,
        description: record.description.unwrap_or_default(),
        attachments,
        is_done: record.is_done.unwrap_or(false),
        comments: record.comments,
        created_at: record.created_at.unwrap_or(DateTime::UNIX_EPOCH),
    })
}
